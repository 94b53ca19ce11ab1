use crate::domain::{IncidentPatch, NewIncident};
use crate::error::AppError;
use crate::normalize::timestamps::normalize_report_date;

pub const MAX_LABEL_CHARS: usize = 255;

fn check_label(field: &str, value: &str, problems: &mut Vec<String>) {
    let len = value.trim().chars().count();
    if len == 0 {
        problems.push(format!("{field} is required"));
    } else if len > MAX_LABEL_CHARS {
        problems.push(format!("{field} exceeds {MAX_LABEL_CHARS} characters"));
    }
}

/// Validate and canonicalize an incident submitted by a reporting application.
///
/// Labels are trimmed, the report date is normalized to RFC3339 UTC, and blank image/video
/// references are treated as absent. All violations are reported together in `details`.
pub fn validate_new_incident(input: &NewIncident) -> Result<NewIncident, AppError> {
    let mut problems = Vec::new();
    check_label("project", &input.project, &mut problems);
    check_label("category", &input.category, &mut problems);
    if input.description.trim().is_empty() {
        problems.push("description is required".to_string());
    }

    let date = match input.date.as_deref() {
        Some(raw) => match normalize_report_date(raw) {
            Ok(canonical) => Some(canonical),
            Err(e) => {
                problems.push(format!(
                    "date: {}",
                    e.details.unwrap_or(e.message)
                ));
                None
            }
        },
        None => None,
    };

    if !problems.is_empty() {
        return Err(AppError::validation("Incident is invalid").with_details(problems.join("; ")));
    }

    let attachment = |url: &Option<String>| {
        url.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(NewIncident {
        project: input.project.trim().to_string(),
        category: input.category.trim().to_string(),
        description: input.description.trim().to_string(),
        full_description: input.full_description.trim().to_string(),
        status: input.status,
        date,
        image: attachment(&input.image),
        video: attachment(&input.video),
    })
}

/// An operator update must change something.
pub fn validate_patch(patch: &IncidentPatch) -> Result<(), AppError> {
    if patch.is_empty() {
        return Err(AppError::validation(
            "Update must include status or comments",
        ));
    }
    Ok(())
}
