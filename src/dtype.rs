//! Element Types
//!
//! Describes the numeric element type of an array and how it is persisted.
//!
//! ## Responsibilities
//! - Validate kind/width combinations at configuration time
//! - Encode/decode the fixed, versioned dtype descriptor
//! - Map Rust element types onto dtypes through [`Element`]
//!
//! ## Descriptor Format (V1)
//! ```text
//! ┌─────────────┬──────────┬───────────┬───────────┐
//! │ Version (1) │ Kind (1) │ Width (1) │ Order (1) │
//! └─────────────┴──────────┴───────────┴───────────┘
//!   Kind:  b'i' signed, b'u' unsigned, b'f' float
//!   Order: b'<' little-endian, b'>' big-endian
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{ArrayError, Result};

/// Current descriptor format version
pub const DESCRIPTOR_VERSION: u8 = 1;

/// Descriptor size: Version (1) + Kind (1) + Width (1) + Order (1) = 4 bytes
pub const DESCRIPTOR_SIZE: usize = 4;

/// Numeric kind of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Signed two's complement integer
    Int,
    /// Unsigned integer
    UInt,
    /// IEEE 754 floating point
    Float,
}

impl Kind {
    fn code(self) -> u8 {
        match self {
            Kind::Int => b'i',
            Kind::UInt => b'u',
            Kind::Float => b'f',
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            b'i' => Some(Kind::Int),
            b'u' => Some(Kind::UInt),
            b'f' => Some(Kind::Float),
            _ => None,
        }
    }

    fn supports_width(self, width: usize) -> bool {
        match self {
            Kind::Int | Kind::UInt => matches!(width, 1 | 2 | 4 | 8),
            Kind::Float => matches!(width, 4 | 8),
        }
    }
}

/// Byte order of encoded elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    fn code(self) -> u8 {
        match self {
            ByteOrder::Little => b'<',
            ByteOrder::Big => b'>',
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            b'<' => Some(ByteOrder::Little),
            b'>' => Some(ByteOrder::Big),
            _ => None,
        }
    }
}

/// A validated element type: kind + width + byte order
///
/// Only constructible through [`DType::describe`] (or helpers that call it),
/// so every value in circulation is a supported combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DType {
    kind: Kind,
    width: u8,
    order: ByteOrder,
}

impl DType {
    /// Validate and build a dtype
    ///
    /// Integers may be 1, 2, 4 or 8 bytes wide; floats 4 or 8.
    pub fn describe(kind: Kind, width: usize, order: ByteOrder) -> Result<Self> {
        if !kind.supports_width(width) {
            return Err(ArrayError::Validation(format!(
                "Unsupported width {} for {:?}",
                width, kind
            )));
        }

        Ok(Self {
            kind,
            width: width as u8,
            order,
        })
    }

    /// Dtype of a Rust element type, little-endian
    pub fn of<T: Element>() -> Self {
        Self::of_with_order::<T>(ByteOrder::Little)
    }

    /// Dtype of a Rust element type with an explicit byte order
    pub fn of_with_order<T: Element>(order: ByteOrder) -> Self {
        Self {
            kind: T::KIND,
            width: T::WIDTH as u8,
            order,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Element width in bytes
    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Same dtype with a different byte order
    pub fn with_byte_order(self, order: ByteOrder) -> Self {
        Self { order, ..self }
    }

    /// True if `T` has this dtype's kind and width
    pub fn matches<T: Element>(&self) -> bool {
        self.kind == T::KIND && self.width() == T::WIDTH
    }

    /// Serialize to the fixed 4-byte descriptor
    pub fn to_descriptor(&self) -> [u8; DESCRIPTOR_SIZE] {
        [
            DESCRIPTOR_VERSION,
            self.kind.code(),
            self.width,
            self.order.code(),
        ]
    }

    /// Parse a descriptor produced by [`DType::to_descriptor`]
    pub fn from_descriptor(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DESCRIPTOR_SIZE {
            return Err(ArrayError::Codec(format!(
                "Dtype descriptor must be {} bytes, got {}",
                DESCRIPTOR_SIZE,
                bytes.len()
            )));
        }

        if bytes[0] != DESCRIPTOR_VERSION {
            return Err(ArrayError::Codec(format!(
                "Unsupported dtype descriptor version: {}",
                bytes[0]
            )));
        }

        let kind = Kind::from_code(bytes[1]).ok_or_else(|| {
            ArrayError::Codec(format!("Unknown dtype kind code: 0x{:02x}", bytes[1]))
        })?;
        let order = ByteOrder::from_code(bytes[3]).ok_or_else(|| {
            ArrayError::Codec(format!("Unknown byte order code: 0x{:02x}", bytes[3]))
        })?;

        Self::describe(kind, bytes[2] as usize, order)
            .map_err(|e| ArrayError::Codec(format!("Invalid dtype descriptor: {}", e)))
    }

    /// NumPy-style name, e.g. `float32` (byte order not included)
    pub fn name(&self) -> String {
        let bits = self.width() * 8;
        match self.kind {
            Kind::Int => format!("int{}", bits),
            Kind::UInt => format!("uint{}", bits),
            Kind::Float => format!("float{}", bits),
        }
    }
}

/// Formats as a NumPy type string, e.g. `<f4` or `>i8`
impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.order.code() as char,
            self.kind.code() as char,
            self.width
        )
    }
}

/// Parses NumPy names (`float32`, `uint8`) and type strings (`<f4`, `>i8`,
/// `|u1`, `=f8`). A missing order prefix means little-endian; `=` means the
/// host order.
impl FromStr for DType {
    type Err = ArrayError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ArrayError::Validation(format!("Unrecognized dtype: {:?}", s));

        let (order, rest) = match s.as_bytes().first() {
            Some(b'<') => (ByteOrder::Little, &s[1..]),
            Some(b'>') => (ByteOrder::Big, &s[1..]),
            Some(b'=') => (ByteOrder::native(), &s[1..]),
            Some(b'|') => (ByteOrder::Little, &s[1..]),
            Some(_) => (ByteOrder::Little, s),
            None => return Err(invalid()),
        };

        let (kind, digits, unit) = if let Some(bits) = rest.strip_prefix("uint") {
            (Kind::UInt, bits, 8)
        } else if let Some(bits) = rest.strip_prefix("int") {
            (Kind::Int, bits, 8)
        } else if let Some(bits) = rest.strip_prefix("float") {
            (Kind::Float, bits, 8)
        } else {
            let mut chars = rest.chars();
            let kind = match chars.next() {
                Some('i') => Kind::Int,
                Some('u') => Kind::UInt,
                Some('f') => Kind::Float,
                _ => return Err(invalid()),
            };
            (kind, chars.as_str(), 1)
        };

        let size: usize = digits.parse().map_err(|_| invalid())?;
        if size % unit != 0 {
            return Err(invalid());
        }

        if s.starts_with('|') && size / unit != 1 {
            return Err(ArrayError::Validation(format!(
                "Byte order '|' only applies to 1-byte types: {:?}",
                s
            )));
        }

        Self::describe(kind, size / unit, order)
    }
}

// =============================================================================
// Rust Element Types
// =============================================================================

mod private {
    pub trait Sealed {}
}

/// A Rust numeric type that can be stored in an array
///
/// Implemented for `i8..i64`, `u8..u64`, `f32` and `f64`. Conversions go
/// through `to_*_bytes`/`from_*_bytes`, so floats keep their exact bit
/// patterns (NaN payloads, signed zero).
pub trait Element: private::Sealed + Copy + Default + fmt::Debug + PartialEq + 'static {
    const KIND: Kind;
    const WIDTH: usize;

    /// Append this value's bytes in `order`
    fn write_to(self, order: ByteOrder, out: &mut Vec<u8>);

    /// Read a value from exactly `WIDTH` bytes
    fn read_from(bytes: &[u8], order: ByteOrder) -> Self;
}

macro_rules! impl_element {
    ($($t:ty => $kind:expr),* $(,)?) => {
        $(
            impl private::Sealed for $t {}

            impl Element for $t {
                const KIND: Kind = $kind;
                const WIDTH: usize = std::mem::size_of::<$t>();

                fn write_to(self, order: ByteOrder, out: &mut Vec<u8>) {
                    match order {
                        ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
                        ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
                    }
                }

                fn read_from(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    match order {
                        ByteOrder::Little => <$t>::from_le_bytes(buf),
                        ByteOrder::Big => <$t>::from_be_bytes(buf),
                    }
                }
            }
        )*
    };
}

impl_element! {
    i8 => Kind::Int,
    i16 => Kind::Int,
    i32 => Kind::Int,
    i64 => Kind::Int,
    u8 => Kind::UInt,
    u16 => Kind::UInt,
    u32 => Kind::UInt,
    u64 => Kind::UInt,
    f32 => Kind::Float,
    f64 => Kind::Float,
}
