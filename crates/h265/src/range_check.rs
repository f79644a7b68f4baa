/// Returns `Err(InvalidData)` naming the syntax element when `$n` is outside `[$lower, $upper]`.
///
/// The `0` lower bound form only accepts unsigned values, where the lower
/// comparison would always be true.
macro_rules! range_check {
    ($n:expr,0, $upper:expr) => {{
        trait Unsigned {}
        impl Unsigned for u8 {}
        impl Unsigned for u16 {}
        impl Unsigned for u32 {}
        impl Unsigned for u64 {}
        impl Unsigned for usize {}

        #[inline(always)]
        const fn unsigned_type_check<N: Unsigned>(_: &N) {}
        unsigned_type_check(&$n);

        if $n > $upper {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("{} is out of range [0, {}]: {}", stringify!($n), $upper, $n),
            ))
        } else {
            ::std::result::Result::Ok(())
        }
    }};
    ($n:expr, $lower:expr, $upper:expr) => {{
        if $n < $lower || $n > $upper {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("{} is out of range [{}, {}]: {}", stringify!($n), $lower, $upper, $n),
            ))
        } else {
            ::std::result::Result::Ok(())
        }
    }};
}

pub(crate) use range_check;
