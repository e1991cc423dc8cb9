//! Backend list validation (names, credentials, weights).

use std::collections::HashSet;

use crate::schema::ByedbConfig;

use super::helpers::validate_positive_f64;

pub(crate) fn validate_backends(errors: &mut Vec<String>, config: &ByedbConfig) {
    let mut seen = HashSet::new();

    for (i, backend) in config.backends.iter().enumerate() {
        let label = if backend.name.is_empty() {
            format!("backends[{i}]")
        } else {
            format!("backends.{}", backend.name)
        };

        if backend.name.trim().is_empty() {
            errors.push(format!("{label}.name must not be empty"));
        } else if !seen.insert(backend.name.as_str()) {
            errors.push(format!("{label}.name is duplicated"));
        }

        if backend.api_key.trim().is_empty() {
            errors.push(format!("{label}.api_key must not be empty"));
        }
        if backend.model.trim().is_empty() {
            errors.push(format!("{label}.model must not be empty"));
        }
        validate_positive_f64(errors, &format!("{label}.weight"), backend.weight);

        if let Some(url) = &backend.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("{label}.base_url must be an http(s) URL"));
            }
        }
    }
}
