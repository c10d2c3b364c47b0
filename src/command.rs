use serde::{Deserialize, Serialize};
use std::str::FromStr;

macro_rules! parseable_enum {
    (
        $( #[$attr:meta] )*
        $vis:vis enum $enum:ident { $($(#[$item_attr:meta])* $item:ident),* $(,)? }
    ) => {
        $( #[$attr] )*
        $vis enum $enum {
            $(
                $(#[$item_attr])*
                $item
            ),*
        }

        impl $enum {
            pub const ALL: &'static [$enum] = &[$($enum::$item),*];
        }

        impl FromStr for $enum {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($item) => Ok($enum::$item)),*,
                    _ => Err(format!("No such command: {}", s)),
                }
            }
        }

        impl From<$enum> for String {
            fn from(e: $enum) -> String {
                match e {
                    $($enum::$item => stringify!($item).to_string()),*,
                }
            }
        }
    };
}

parseable_enum! {
    /// Something the user asked the player to do.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(try_from = "String", into = "String")]
    pub enum Command {
        #[default]
        Nop,
        Quit,
        TogglePause,
        Stop,
        SkipForward,
        SkipBackward,
        SeekStart,
    }
}

impl TryFrom<String> for Command {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
