use serde::{Deserialize, Serialize};

/// A named pixel transform that a filter spec can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Grayscale,
    Sepia,
    Cool,
    Warm,
    Vignette,
    Glow,
    Grain,
    Blur,
    Sharpen,
}

/// How an operation consumes its spec value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Switched on by `true`; a numeric value is rejected.
    Toggle,
    /// Takes a signed strength; `true` runs it at strength 0.
    Strength,
}

impl Operation {
    /// Name used as the key inside a filter spec section.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Hue => "hue",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Cool => "cool",
            Self::Warm => "warm",
            Self::Vignette => "vignette",
            Self::Glow => "glow",
            Self::Grain => "grain",
            Self::Blur => "blur",
            Self::Sharpen => "sharpen",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Brightness => "Brightness",
            Self::Contrast => "Contrast",
            Self::Saturation => "Saturation",
            Self::Hue => "Hue",
            Self::Grayscale => "Grayscale",
            Self::Sepia => "Sepia",
            Self::Cool => "Cool",
            Self::Warm => "Warm",
            Self::Vignette => "Vignette",
            Self::Glow => "Glow",
            Self::Grain => "Grain",
            Self::Blur => "Blur",
            Self::Sharpen => "Sharpen",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::Grayscale | Self::Sepia | Self::Cool | Self::Warm => Arity::Toggle,
            _ => Arity::Strength,
        }
    }

    /// Resolve a spec key. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all_builtin().iter().copied().find(|op| op.name() == name)
    }

    /// All built-in operations.
    pub fn all_builtin() -> &'static [Operation] {
        &[
            Self::Brightness,
            Self::Contrast,
            Self::Saturation,
            Self::Hue,
            Self::Grayscale,
            Self::Sepia,
            Self::Cool,
            Self::Warm,
            Self::Vignette,
            Self::Glow,
            Self::Grain,
            Self::Blur,
            Self::Sharpen,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_covers_all_builtins() {
        for op in Operation::all_builtin() {
            assert_eq!(Operation::from_name(op.name()), Some(*op));
        }
        assert_eq!(Operation::all_builtin().len(), 13);
    }

    #[test]
    fn test_unknown_and_reserved_names() {
        assert_eq!(Operation::from_name("posterize"), None);
        assert_eq!(Operation::from_name("crop"), None);
        assert_eq!(Operation::from_name("Brightness"), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Operation::Sepia.arity(), Arity::Toggle);
        assert_eq!(Operation::Warm.arity(), Arity::Toggle);
        assert_eq!(Operation::Blur.arity(), Arity::Strength);
        assert_eq!(Operation::Hue.arity(), Arity::Strength);
    }

    #[test]
    fn test_serde_names_match_spec_keys() {
        let json = serde_json::to_string(&Operation::Grayscale).unwrap();
        assert_eq!(json, "\"grayscale\"");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Operation::Glow.display_name(), "Glow");
    }
}
