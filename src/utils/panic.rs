use std::any::Any;

/// Extracts the message from a payload caught by `catch_unwind`.
pub fn panic_message(panic_info: &(dyn Any + Send)) -> &str {
    panic_info
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| panic_info.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::catch_unwind;

    #[test]
    fn test_panic_message_from_str_and_string() {
        let payload = catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let code = 42;
        let payload = catch_unwind(|| panic!("formatted {code}")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");
    }

    #[test]
    fn test_panic_message_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
