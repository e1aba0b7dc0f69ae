use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MessageRole {
    User => "user",
    Assistant => "assistant",
});

str_enum!(Language {
    En => "en",
    Rw => "rw",
    Fr => "fr",
});

str_enum!(UserRole {
    Patient => "patient",
    Doctor => "doctor",
    Admin => "admin",
});

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl Language {
    /// Resolve a caller-supplied tag. Unknown or missing tags resolve to
    /// English so the chat surface never rejects a request over language.
    pub fn from_tag(tag: Option<&str>) -> Self {
        tag.map(|t| t.trim().to_ascii_lowercase())
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }
}
