pub mod optional_duration {
    use crate::time::timeunit::DurationUnit;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) => value
                .parse::<DurationUnit>()
                .map(|unit| Some(Duration::from(unit)))
                .map_err(|err| D::Error::custom(err.to_string())),
            None => Ok(None),
        }
    }
}

/// A list given either as a sequence or as one comma-separated string, the
/// only shape environment variables can take.
pub mod string_list {
    use serde::{Deserialize, Deserializer};

    #[derive(serde_derive::Deserialize)]
    #[serde(untagged)]
    enum Items {
        List(Vec<String>),
        Joined(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Items::deserialize(deserializer)? {
            Items::List(items) => items,
            Items::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect(),
        })
    }
}
