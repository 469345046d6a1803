//! Status hints and progress counts derived from related records.

use serde::Serialize;

use crate::enums::{ComplianceStatus, CompletionStatus, VerificationStatus};
use crate::jira::JiraIssue;
use crate::project::Measure;

/// Suggests a requirement's compliance status from the distinct compliance
/// statuses of its measures. Measures without a status are ignored.
pub fn compliance_status_hint<'a, I>(statuses: I) -> Option<ComplianceStatus>
where
    I: IntoIterator<Item = &'a ComplianceStatus>,
{
    let (mut any_c, mut any_pc, mut any_nc, mut any_na, mut any_other) =
        (false, false, false, false, false);
    for status in statuses {
        match status {
            ComplianceStatus::Compliant => any_c = true,
            ComplianceStatus::PartiallyCompliant => any_pc = true,
            ComplianceStatus::NonCompliant => any_nc = true,
            ComplianceStatus::NotApplicable => any_na = true,
            ComplianceStatus::Custom(_) => any_other = true,
        }
    }

    if any_c && !(any_pc || any_nc) {
        Some(ComplianceStatus::Compliant)
    } else if any_pc || (any_c && any_nc) {
        Some(ComplianceStatus::PartiallyCompliant)
    } else if any_nc && !(any_c || any_pc) {
        Some(ComplianceStatus::NonCompliant)
    } else if any_na && !any_other {
        Some(ComplianceStatus::NotApplicable)
    } else {
        None
    }
}

/// Returns the hint when it contradicts a status that has been set.
pub fn compliance_status_alert(
    status: Option<&ComplianceStatus>,
    hint: Option<ComplianceStatus>,
) -> Option<ComplianceStatus> {
    match (status, hint) {
        (Some(status), Some(hint)) if *status != hint => Some(hint),
        _ => None,
    }
}

/// Whether work under this compliance status has to be completed. Only
/// compliant, partially compliant and unrated items do.
pub fn needs_completion(status: Option<&ComplianceStatus>) -> bool {
    matches!(
        status,
        None | Some(ComplianceStatus::Compliant) | Some(ComplianceStatus::PartiallyCompliant)
    )
}

/// Completion and verification tallies over a set of measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
    /// Measures that need completion.
    pub completion_count: usize,
    pub completed_count: usize,
    /// Measures needing completion that have a verification method.
    pub verification_count: usize,
    pub verified_count: usize,
}

impl ProgressCounts {
    /// Tallies `measures`, skipping those that need no completion.
    pub fn of_measures<'a, I>(measures: I) -> Self
    where
        I: IntoIterator<Item = &'a Measure>,
    {
        let mut counts = Self::default();
        for measure in measures {
            counts.add(measure);
        }
        counts
    }

    pub fn add(&mut self, measure: &Measure) {
        if !needs_completion(measure.compliance_status.as_ref()) {
            return;
        }
        self.completion_count += 1;
        if measure.completion_status == Some(CompletionStatus::Completed) {
            self.completed_count += 1;
        }
        if measure.verification_method.is_some() {
            self.verification_count += 1;
            if measure.verification_status == Some(VerificationStatus::Verified) {
                self.verified_count += 1;
            }
        }
    }

    /// Counts a requirement without measures as one item still to complete.
    pub fn add_unplanned(&mut self) {
        self.completion_count += 1;
    }

    /// Share of completed measures, `None` when nothing needs completion.
    pub fn completion_progress(&self) -> Option<f64> {
        ratio(self.completed_count, self.completion_count)
    }

    pub fn verification_progress(&self) -> Option<f64> {
        ratio(self.verified_count, self.verification_count)
    }
}

fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole != 0).then(|| part as f64 / whole as f64)
}

/// Suggests a measure's completion status from its linked Jira issue.
///
/// Measures that are neither compliant, partially compliant nor unrated get
/// no hint. Otherwise a completed issue wins over the stored status.
pub fn completion_status_hint(
    measure: &Measure,
    jira_issue: Option<&JiraIssue>,
) -> Option<CompletionStatus> {
    if !needs_completion(measure.compliance_status.as_ref()) {
        return None;
    }
    if jira_issue.is_some_and(|issue| issue.status.completed) {
        return Some(CompletionStatus::Completed);
    }
    measure.completion_status.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::VerificationMethod;
    use crate::jira::JiraIssueStatus;
    use crate::key::Key;
    use pretty_assertions::assert_eq;
    use ComplianceStatus::*;

    fn hint(statuses: &[ComplianceStatus]) -> Option<ComplianceStatus> {
        compliance_status_hint(statuses)
    }

    #[test]
    fn compliance_hint_table() {
        assert_eq!(hint(&[]), None);
        assert_eq!(hint(&[Compliant]), Some(Compliant));
        assert_eq!(hint(&[Compliant, NotApplicable]), Some(Compliant));
        assert_eq!(hint(&[Compliant, NonCompliant]), Some(PartiallyCompliant));
        assert_eq!(hint(&[PartiallyCompliant, NotApplicable]), Some(PartiallyCompliant));
        assert_eq!(hint(&[NonCompliant, NotApplicable]), Some(NonCompliant));
        assert_eq!(hint(&[NotApplicable]), Some(NotApplicable));
    }

    fn issue(completed: bool) -> JiraIssue {
        JiraIssue {
            id: "10001".into(),
            key: "P-1".into(),
            summary: "Do it".into(),
            description: None,
            issuetype_id: "3".into(),
            project_id: "100".into(),
            status: JiraIssueStatus {
                name: if completed { "Done" } else { "To Do" }.into(),
                color_name: if completed { "green" } else { "blue-gray" }.into(),
                completed,
            },
            url: "https://jira.example.com/browse/P-1".into(),
        }
    }

    #[test]
    fn completed_issue_marks_measure_completed() {
        let mut measure = Measure::new("M", Key::new(0));
        measure.completion_status = Some(CompletionStatus::Open);

        assert_eq!(
            completion_status_hint(&measure, Some(&issue(true))),
            Some(CompletionStatus::Completed)
        );
        assert_eq!(
            completion_status_hint(&measure, Some(&issue(false))),
            Some(CompletionStatus::Open)
        );
        assert_eq!(completion_status_hint(&measure, None), Some(CompletionStatus::Open));
    }

    #[test]
    fn non_compliant_measure_gets_no_completion_hint() {
        let mut measure = Measure::new("M", Key::new(0));
        measure.compliance_status = Some(NonCompliant);
        assert_eq!(completion_status_hint(&measure, Some(&issue(true))), None);
    }

    #[test]
    fn alert_only_when_hint_contradicts_set_status() {
        assert_eq!(compliance_status_alert(None, Some(Compliant)), None);
        assert_eq!(compliance_status_alert(Some(&Compliant), Some(Compliant)), None);
        assert_eq!(compliance_status_alert(Some(&Compliant), None), None);
        assert_eq!(
            compliance_status_alert(Some(&Compliant), Some(PartiallyCompliant)),
            Some(PartiallyCompliant)
        );
    }

    fn measure_with(
        compliance: Option<ComplianceStatus>,
        completion: Option<CompletionStatus>,
        verification: Option<VerificationStatus>,
    ) -> Measure {
        let mut measure = Measure::new("M", Key::new(0));
        measure.compliance_status = compliance;
        measure.completion_status = completion;
        if verification.is_some() {
            measure.verification_method = Some(VerificationMethod::Test);
        }
        measure.verification_status = verification;
        measure
    }

    #[test]
    fn progress_counts_only_measures_needing_completion() {
        let measures = [
            measure_with(None, Some(CompletionStatus::Completed), Some(VerificationStatus::Verified)),
            measure_with(Some(Compliant), Some(CompletionStatus::Open), None),
            measure_with(
                Some(PartiallyCompliant),
                Some(CompletionStatus::Completed),
                Some(VerificationStatus::NotVerified),
            ),
            // Neither counts: nothing to complete.
            measure_with(Some(NonCompliant), Some(CompletionStatus::Completed), None),
            measure_with(
                Some(NotApplicable),
                Some(CompletionStatus::Completed),
                Some(VerificationStatus::Verified),
            ),
        ];

        let counts = ProgressCounts::of_measures(&measures);
        assert_eq!(
            counts,
            ProgressCounts {
                completion_count: 3,
                completed_count: 2,
                verification_count: 2,
                verified_count: 1,
            }
        );
        assert_eq!(counts.completion_progress(), Some(2.0 / 3.0));
        assert_eq!(counts.verification_progress(), Some(0.5));
    }

    #[test]
    fn progress_is_none_without_items() {
        let mut counts = ProgressCounts::default();
        assert_eq!(counts.completion_progress(), None);
        assert_eq!(counts.verification_progress(), None);

        counts.add_unplanned();
        assert_eq!(counts.completion_progress(), Some(0.0));
        assert_eq!(counts.verification_progress(), None);
    }
}
