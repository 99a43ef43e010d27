use crate::time::error::Error;
use core::str::FromStr;
use lazy_static::*;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(
        r"^(?P<value>\d+)\s*(?P<unit>[a-z]+)$"
    )
    .expect("Regex compilation error");
}

/// A duration written the way class manifests spell it, e.g. `200ms` or `2s`.
#[derive(Debug, PartialEq)]
pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, PartialEq)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_REGEX
            .captures(s.trim())
            .ok_or_else(|| Error::Syntax(s.to_owned()))?;
        let value = caps["value"]
            .parse()
            .map_err(|_| Error::Syntax(s.to_owned()))?;
        let unit = caps["unit"].parse::<TimeUnit>()?;
        Ok(Self { value, unit })
    }
}

impl From<DurationUnit> for Duration {
    fn from(duration: DurationUnit) -> Self {
        let value = duration.value;
        match duration.unit {
            TimeUnit::Nanosecond => Duration::from_nanos(value),
            TimeUnit::Microsecond => Duration::from_micros(value),
            TimeUnit::Millisecond => Duration::from_millis(value),
            TimeUnit::Second => Duration::from_secs(value),
            TimeUnit::Minute => Duration::from_secs(value * 60),
            TimeUnit::Hour => Duration::from_secs(value * 60 * 60),
            TimeUnit::Day => Duration::from_secs(value * 60 * 60 * 24),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanosecond),
            "us" | "microsecond" | "micros" | "microseconds" => Ok(TimeUnit::Microsecond),
            "ms" | "millisecond" | "millis" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "s" | "second" | "secs" | "seconds" => Ok(TimeUnit::Second),
            "m" | "minute" | "mins" | "minutes" => Ok(TimeUnit::Minute),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            "d" | "day" | "days" => Ok(TimeUnit::Day),
            _ => Err(Error::UnitNotSupported(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::time::error::Error;
    use crate::time::timeunit::DurationUnit;
    use crate::time::timeunit::TimeUnit;
    use std::time::Duration;

    #[test]
    fn test_building_time_unit_from_long_names() {
        assert_eq!("millis".parse::<TimeUnit>(), Ok(TimeUnit::Millisecond));
        assert_eq!("minutes".parse::<TimeUnit>(), Ok(TimeUnit::Minute));
    }

    #[test]
    fn test_conversion_duration_unit_to_duration() {
        let unit = "200ms".parse::<DurationUnit>().unwrap();
        let result: Duration = unit.into();

        assert_eq!(result, Duration::from_millis(200));
    }

    #[test]
    fn test_duration_accepts_spelled_out_units() {
        let result: Duration = "2 seconds".parse::<DurationUnit>().unwrap().into();

        assert_eq!(result, Duration::from_secs(2));
    }

    #[test]
    fn test_unknown_unit_is_rejected() {
        let result = "5 fortnights".parse::<DurationUnit>();

        assert_eq!(result, Err(Error::UnitNotSupported("fortnights".to_owned())));
    }

    #[test]
    fn test_missing_value_is_syntax_error() {
        assert!(matches!("ms".parse::<DurationUnit>(), Err(Error::Syntax(_))));
    }
}
