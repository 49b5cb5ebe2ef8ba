use crate::foundation::config::OptimizationConfig;
use crate::foundation::core::ImageDimensions;

/// Advisory result of [`validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// `true` when no issue was found.
    pub is_valid: bool,
    /// One entry per failed check.
    pub issues: Vec<String>,
    /// Suggested action for each issue, in the same order.
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    fn push(&mut self, issue: String, recommendation: &str) {
        self.issues.push(issue);
        self.recommendations.push(recommendation.to_owned());
    }
}

/// Check an input against the configured limits.
///
/// Every check runs even when an earlier one fails. Never fails itself.
pub fn validate(byte_size: u64, dims: ImageDimensions, config: &OptimizationConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if byte_size > config.max_file_size {
        report.push(
            format!(
                "file size {} exceeds the maximum of {}",
                human_bytes(byte_size),
                human_bytes(config.max_file_size)
            ),
            "Compress the image or save it at a lower quality before uploading.",
        );
    }

    if dims.max_side() > config.max_dimension {
        report.push(
            format!(
                "image dimensions {dims} exceed the maximum side of {}px",
                config.max_dimension
            ),
            "The image will be resized automatically; upload a smaller image for faster processing.",
        );
    }

    let estimated = dims.rgba_bytes();
    if estimated > config.memory_threshold_bytes() {
        report.push(
            format!(
                "estimated memory use {} exceeds the {} MB threshold",
                human_bytes(estimated),
                config.memory_threshold_mb
            ),
            "Use a lower resolution image to reduce memory use.",
        );
    }

    report.is_valid = report.issues.is_empty();
    if !report.is_valid {
        tracing::info!(issues = report.issues.len(), %dims, byte_size, "input failed advisory validation");
    }
    report
}

fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.1} MB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/prepare/validate.rs"]
mod tests;
