// Console logging gated by the `debug` config flag. Prefetch warnings go
// through `console.warn` unconditionally; this is only for chatty tracing.

pub(crate) fn debug(enabled: bool, message: &str) {
    if enabled {
        web_sys::console::log_1(&message.into());
    }
}
