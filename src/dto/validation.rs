//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dto::roster::{AttributionInput, CustomOptionInput};
use crate::dao::models::AttributionRole;

/// Validates that a display name is not blank once trimmed.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Validates the curated attribution set submitted for one song.
///
/// Rejects duplicate participants (the storage key is one row per
/// `(song, participant)` pair) and the `decoy` role, which is owned by the
/// reassignment engine and must never be hand-edited.
pub fn validate_curated_attributions(
    attributions: &Vec<AttributionInput>,
) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for entry in attributions {
        if !seen.insert(entry.participant_id) {
            let mut err = ValidationError::new("duplicate_participant");
            err.message = Some(
                format!("Participant {} listed more than once", entry.participant_id).into(),
            );
            return Err(err);
        }

        if entry.role == AttributionRole::Decoy {
            let mut err = ValidationError::new("decoy_role_reserved");
            err.message =
                Some("Role `decoy` is assigned automatically and cannot be set by hand".into());
            return Err(err);
        }
    }

    Ok(())
}

/// Validates custom option labels (each must be non-blank).
pub fn validate_custom_option_labels(
    options: &Vec<CustomOptionInput>,
) -> Result<(), ValidationError> {
    if options.iter().any(|option| option.label.trim().is_empty()) {
        let mut err = ValidationError::new("custom_option_label_blank");
        err.message = Some("Custom option labels must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::CustomOptionRole;
    use uuid::Uuid;

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Nami").is_ok());
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn test_validate_curated_attributions_rejects_duplicates() {
        let participant = Uuid::new_v4();
        let rows = vec![
            AttributionInput {
                participant_id: participant,
                role: AttributionRole::Real,
            },
            AttributionInput {
                participant_id: participant,
                role: AttributionRole::Fixed,
            },
        ];
        assert!(validate_curated_attributions(&rows).is_err());
    }

    #[test]
    fn test_validate_curated_attributions_rejects_decoy_role() {
        let rows = vec![AttributionInput {
            participant_id: Uuid::new_v4(),
            role: AttributionRole::Decoy,
        }];
        assert!(validate_curated_attributions(&rows).is_err());
    }

    #[test]
    fn test_validate_curated_attributions_accepts_curated_roles() {
        let rows = vec![
            AttributionInput {
                participant_id: Uuid::new_v4(),
                role: AttributionRole::Real,
            },
            AttributionInput {
                participant_id: Uuid::new_v4(),
                role: AttributionRole::Fixed,
            },
        ];
        assert!(validate_curated_attributions(&rows).is_ok());
    }

    #[test]
    fn test_validate_custom_option_labels() {
        let ok = vec![CustomOptionInput {
            label: "guest charter".into(),
            role: CustomOptionRole::Fake,
        }];
        let blank = vec![CustomOptionInput {
            label: "  ".into(),
            role: CustomOptionRole::Real,
        }];
        assert!(validate_custom_option_labels(&ok).is_ok());
        assert!(validate_custom_option_labels(&blank).is_err());
    }
}
