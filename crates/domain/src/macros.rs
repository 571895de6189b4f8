//! Macros for name-mapped enums
//!
//! Counter catalogues and configuration enums all map each variant to a
//! fixed string. These macros generate that mapping once.
//!
//! # Example
//!
//! ```rust
//! use blobmeter_domain::impl_snake_case_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Upload,
//!     Download,
//! }
//!
//! impl_snake_case_conversions!(Direction {
//!     Upload => "upload",
//!     Download => "download",
//! });
//!
//! assert_eq!("UPLOAD".parse::<Direction>().unwrap(), Direction::Upload);
//! assert_eq!(Direction::Download.to_string(), "download");
//! ```

/// Implements Display and FromStr for enums with snake_case names
///
/// This macro generates:
/// - `as_str()`: the canonical name
/// - Display trait: writes the canonical name
/// - FromStr trait: case-insensitive parse into
///   [`BlobMeterError::InvalidInput`](crate::BlobMeterError) on mismatch
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their names
#[macro_export]
macro_rules! impl_snake_case_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical name of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::BlobMeterError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::BlobMeterError::InvalidInput(format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}

/// Declares a counter catalogue: an enum whose variants map to fixed
/// dotted counter names.
///
/// Generates the enum, an `ALL` slice in declaration order, `name()` and a
/// Display impl writing the name.
#[macro_export]
macro_rules! counter_catalogue {
    (
        $(#[$meta:meta])*
        $vis:vis enum $enum_name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $name:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $enum_name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $enum_name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Dotted counter name, without scope or key prefix.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}
