use log::LevelFilter;
use std::time::SystemTime;

/// How much of an unexpected response body is kept for diagnostics.
pub const BODY_SAMPLE_LIMIT: usize = 200;

/// First [`BODY_SAMPLE_LIMIT`] bytes of a body, cut back to a char boundary.
pub fn body_sample(body: &str) -> String {
    if body.len() <= BODY_SAMPLE_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_SAMPLE_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

pub fn setup_logger(level: Option<LevelFilter>) -> Result<(), fern::InitError> {
    let filter = match level {
        None => { LevelFilter::Debug }
        Some(v) => { v }
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(filter)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_sample_is_bounded() {
        let long = "x".repeat(500);
        assert_eq!(BODY_SAMPLE_LIMIT, body_sample(&long).len());
        assert_eq!("short", body_sample("short"));
    }

    #[test]
    fn test_body_sample_respects_char_boundary() {
        let body = format!("{}é", "a".repeat(BODY_SAMPLE_LIMIT - 1));
        let sample = body_sample(&body);
        assert_eq!(BODY_SAMPLE_LIMIT - 1, sample.len());
    }
}
