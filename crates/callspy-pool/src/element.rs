//! Element types that may be viewed through a [`Slice`](crate::Slice).

/// A plain-old-data element type.
///
/// # Safety
///
/// Implementors must be `Copy`, contain no padding bytes, and be valid for
/// every bit pattern. Observers copy element memory byte-for-byte, and tool
/// pools start zero-filled.
#[allow(unsafe_code)]
pub unsafe trait Element: Copy + 'static {}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            // SAFETY: primitive integers and floats have no padding and
            // accept every bit pattern.
            #[allow(unsafe_code)]
            unsafe impl Element for $t {}
        )*
    };
}

impl_element!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64);

// SAFETY: an array of padding-free elements has no padding.
#[allow(unsafe_code)]
unsafe impl<T: Element, const N: usize> Element for [T; N] {}
