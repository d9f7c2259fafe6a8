/// Build a single-problem [`ErrorValue`](crate::ErrorValue) for an early return
///
/// Arguments after the status are positional: title, detail, source pointer.
/// Anything implementing `Display` is accepted, so a caught error can be
/// passed straight in as the detail.
///
/// ```
/// use errata_core::error_value;
///
/// let err = error_value!(400, "bad body sent", "expected a JSON object", "/data");
/// assert_eq!(err.status(), 400);
/// assert_eq!(err.to_string(), "error #1: bad body sent");
/// ```
#[macro_export]
macro_rules! error_value {
    ($status:expr $(,)?) => {
        $crate::ErrorValue::new($status, ::core::iter::empty::<::std::string::String>())
    };
    ($status:expr, $($arg:expr),+ $(,)?) => {
        $crate::ErrorValue::new($status, [$(::std::string::ToString::to_string(&$arg)),+])
    };
}
