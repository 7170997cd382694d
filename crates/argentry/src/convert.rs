//! Conversion of raw tokens into typed values.

use std::any::Any;
use std::ffi::OsString;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::ConversionError;

/// A type an entry can be bound to.
///
/// `from_arg` turns a single token into a value, `to_arg` renders a value
/// back into text for help output and default display. Types with a natural
/// "nothing given" state return it from `absent`; entries bound to such a
/// type may be omitted without an explicit default.
pub trait ArgValue: Sized + 'static {
    fn from_arg(token: &str) -> Result<Self, ConversionError>;

    fn to_arg(&self) -> String;

    fn absent() -> Option<Self> {
        None
    }
}

/// Split `s` on `,`.
///
/// A string without commas (including `""`) yields a single element.
pub fn split(s: &str) -> Vec<&str> {
    s.split(',').collect()
}

/// Implement [`ArgValue`] for types that already implement `FromStr` and
/// `Display`.
///
/// ```
/// #[derive(Debug, PartialEq)]
/// struct Level(u8);
///
/// impl std::str::FromStr for Level {
///     type Err = std::num::ParseIntError;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         s.parse().map(Level)
///     }
/// }
///
/// impl std::fmt::Display for Level {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", self.0)
///     }
/// }
///
/// argentry::impl_arg_value_from_str!(Level);
///
/// use argentry::ArgValue;
/// assert_eq!(Level::from_arg("3").unwrap(), Level(3));
/// ```
#[macro_export]
macro_rules! impl_arg_value_from_str {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::ArgValue for $t {
                fn from_arg(token: &str) -> ::std::result::Result<Self, $crate::ConversionError> {
                    token
                        .parse::<$t>()
                        .map_err(|e| $crate::ConversionError::new(stringify!($t), e))
                }

                fn to_arg(&self) -> ::std::string::String {
                    self.to_string()
                }
            }
        )+
    };
}

crate::impl_arg_value_from_str!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);
crate::impl_arg_value_from_str!(std::net::IpAddr, std::net::SocketAddr);

impl ArgValue for bool {
    // Anything that is not an explicit "true" is false; flags never fail.
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        Ok(matches!(token, "true" | "TRUE" | "1"))
    }

    fn to_arg(&self) -> String {
        self.to_string()
    }
}

impl ArgValue for char {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        let mut chars = token.chars();
        let Some(first) = chars.next() else {
            return Err(ConversionError::new("char", "empty string"));
        };
        if chars.next().is_none() {
            return Ok(first);
        }

        let code = match token.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => token.parse::<u32>(),
        }
        .map_err(|e| ConversionError::new("char", e))?;
        char::from_u32(code).ok_or_else(|| {
            ConversionError::new("char", format!("{code:#x} is not a valid character"))
        })
    }

    fn to_arg(&self) -> String {
        self.to_string()
    }
}

impl ArgValue for String {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        Ok(token.to_string())
    }

    fn to_arg(&self) -> String {
        self.clone()
    }
}

impl ArgValue for PathBuf {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        Ok(PathBuf::from(token))
    }

    fn to_arg(&self) -> String {
        self.display().to_string()
    }
}

impl ArgValue for OsString {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        Ok(OsString::from(token))
    }

    fn to_arg(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl<T: ArgValue> ArgValue for Vec<T> {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        // "" splits into one empty element but means "no elements" here.
        if token.is_empty() {
            return Ok(Vec::new());
        }
        split(token).into_iter().map(T::from_arg).collect()
    }

    fn to_arg(&self) -> String {
        self.iter()
            .map(ArgValue::to_arg)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<T: ArgValue> ArgValue for Option<T> {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        T::from_arg(token).map(Some)
    }

    fn to_arg(&self) -> String {
        match self {
            Some(v) => v.to_arg(),
            None => "none".to_string(),
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: ArgValue> ArgValue for Box<T> {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        T::from_arg(token).map(Box::new)
    }

    fn to_arg(&self) -> String {
        (**self).to_arg()
    }
}

impl<T: ArgValue> ArgValue for Rc<T> {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        T::from_arg(token).map(Rc::new)
    }

    fn to_arg(&self) -> String {
        (**self).to_arg()
    }
}

impl<T: ArgValue> ArgValue for Arc<T> {
    fn from_arg(token: &str) -> Result<Self, ConversionError> {
        T::from_arg(token).map(Arc::new)
    }

    fn to_arg(&self) -> String {
        (**self).to_arg()
    }
}

/// Type-erased conversion target owned by an entry.
pub(crate) trait Slot: Any {
    fn convert(&mut self, raw: &str) -> Result<(), ConversionError>;

    /// Install a typed default. Hands the value back if it has the wrong type.
    fn accept_default(&mut self, default: Box<dyn Any>) -> Result<(), Box<dyn Any>>;

    fn clear(&mut self);

    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct TypedSlot<T> {
    pub(crate) value: Option<T>,
}

impl<T> TypedSlot<T> {
    pub(crate) fn new() -> Self {
        Self { value: None }
    }
}

impl<T: ArgValue> Slot for TypedSlot<T> {
    fn convert(&mut self, raw: &str) -> Result<(), ConversionError> {
        match T::from_arg(raw) {
            Ok(v) => {
                self.value = Some(v);
                Ok(())
            }
            Err(e) => {
                self.value = None;
                Err(e)
            }
        }
    }

    fn accept_default(&mut self, default: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let v = default.downcast::<T>()?;
        self.value = Some(*v);
        Ok(())
    }

    fn clear(&mut self) {
        self.value = None;
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
