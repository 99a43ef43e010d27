use serde::Serializer;
use std::time::Duration;

/// Durations as fractional milliseconds.
pub fn duration_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_derive::Serialize;

    #[derive(Serialize)]
    struct Timed {
        #[serde(serialize_with = "duration_millis")]
        took: Duration,
    }

    #[test]
    fn test_serializes_milliseconds() {
        let timed = Timed {
            took: Duration::from_micros(1500),
        };

        assert_eq!(serde_json::to_string(&timed).unwrap(), r#"{"took":1.5}"#);
    }
}
