/// Which codec operation an observer callback refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

/// Fire-and-forget notifications around each encode/decode call.
///
/// Callbacks run synchronously and must not influence control flow; the
/// codec behaves identically under [`NoopObserver`]. `error` fires before
/// the failing call returns, with the rendered error message.
pub trait Observer {
    fn begin(&self, _op: Operation) {}
    fn end(&self, _op: Operation) {}
    fn error(&self, _op: Operation, _message: &str) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl Observer for Recorder {
        fn begin(&self, op: Operation) {
            self.events.borrow_mut().push(format!("begin {op:?}"));
        }

        fn end(&self, op: Operation) {
            self.events.borrow_mut().push(format!("end {op:?}"));
        }

        fn error(&self, op: Operation, message: &str) {
            self.events
                .borrow_mut()
                .push(format!("error {op:?}: {message}"));
        }
    }

    #[rstest::rstest]
    fn test_observer_sees_successful_decode() {
        let recorder = Recorder::default();
        let value =
            crate::decode_with_observer("a: 1", &crate::DecodeOptions::default(), &recorder)
                .unwrap();
        assert_eq!(value.get("a").and_then(crate::Value::as_i64), Some(1));
        assert_eq!(
            *recorder.events.borrow(),
            vec!["begin Decode".to_string(), "end Decode".to_string()]
        );
    }

    #[rstest::rstest]
    fn test_observer_sees_decode_failure() {
        let recorder = Recorder::default();
        let result =
            crate::decode_with_observer("tags[2]: a", &crate::DecodeOptions::default(), &recorder);
        assert!(result.is_err());
        let events = recorder.events.borrow();
        assert_eq!(events[0], "begin Decode");
        assert!(events[1].starts_with("error Decode:"));
    }

    #[rstest::rstest]
    fn test_noop_observer_changes_nothing() {
        let plain = crate::encode_default(&crate::Value::from(1i64)).unwrap();
        let observed = crate::encode_with_observer(
            &crate::Value::from(1i64),
            &crate::EncodeOptions::default(),
            &NoopObserver,
        )
        .unwrap();
        assert_eq!(plain, observed);
    }
}
