use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use interplay_protocol::config::ConfigError;
use interplay_protocol::scenario::Scenario;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid scenario: {0}")]
    Invalid(#[from] ConfigError),
}

/// Overrides given on the command line, applied after loading.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub check_interval: Option<f32>,
}

pub fn parse_scenario(path: &Path, text: &str) -> Result<Scenario, ScenarioError> {
    serde_json::from_str(text).map_err(|source| ScenarioError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the scenario at `path`, or the built-in one, and validate it.
pub fn load_scenario(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<Scenario, ScenarioError> {
    let mut scenario = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse_scenario(path, &text)?
        }
        None => Scenario::default(),
    };

    if let Some(interval) = overrides.check_interval {
        scenario.focus.check_interval = interval;
    }
    scenario.validate()?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOOR: &str = r#"{
        "props": [
            {
                "center": [0.0, 0.0, -2.0],
                "display_name": "Door",
                "action_text": "Open",
                "interaction_duration": 1.0
            }
        ],
        "focus": { "check_interval": 0.1 },
        "walk": {
            "from": [0.0, 0.0, 0.0],
            "to": [0.0, 0.0, 0.0],
            "direction": [0.0, 0.0, -1.0],
            "duration": 5.0
        }
    }"#;

    #[test]
    fn parses_flattened_props_with_defaults() {
        let scenario = parse_scenario(Path::new("door.json"), DOOR).unwrap();
        let door = &scenario.props[0];

        assert_eq!(door.interactable.display_name, "Door");
        assert_eq!(door.interactable.interaction_duration, 1.0);
        assert_eq!(door.interactable.interaction_radius, 2.0);
        assert!(door.interactable.allow_multiple_interactors);
        assert_eq!(door.half_extent, 0.5);
        assert_eq!(door.disable_after, None);
        assert_eq!(scenario.focus.check_interval, 0.1);
        assert_eq!(scenario.focus.check_distance, 10.0);
    }

    #[test]
    fn malformed_json_names_the_file() {
        let err = parse_scenario(Path::new("broken.json"), "{ \"props\": ").unwrap_err();
        assert!(err.to_string().starts_with("cannot parse broken.json"));
    }

    #[test]
    fn overrides_are_validated_too() {
        let err = load_scenario(
            None,
            Overrides {
                check_interval: Some(-1.0),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Invalid(ConfigError::InvalidNumber {
                field: "check_interval",
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_scenario(Some(Path::new("/nonexistent/scenario.json")), Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }
}
