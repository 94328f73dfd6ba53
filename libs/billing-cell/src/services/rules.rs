use tracing::debug;

use shared_config::AppConfig;
use shared_models::{BillingStatus, Patient, PatientCategory};

/// What a completed session costs and how the resulting bill starts out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillingOutcome {
    pub amount: f64,
    pub status: BillingStatus,
}

/// The category-keyed billing rule table, evaluated once per completion.
///
/// Exhaustive over `PatientCategory` so a new category fails to compile until
/// its row is added here. Paid-without-concession and unrecognized patients
/// intentionally share the standard-rate Pending row.
pub fn evaluate_billing_rule(patient: &Patient, config: &AppConfig) -> BillingOutcome {
    let outcome = match patient.category {
        // Referred sessions carry no charge; shown as N/A on documents.
        PatientCategory::Referral => BillingOutcome {
            amount: 0.0,
            status: BillingStatus::Completed,
        },
        // VIPs are billed at the standard rate with the amount forced to zero.
        PatientCategory::Vip => BillingOutcome {
            amount: 0.0,
            status: BillingStatus::AutoPaid,
        },
        PatientCategory::PaidWithConcession => {
            let discount = patient.concession_percent.unwrap_or(0.0);
            BillingOutcome {
                amount: config.standard_session_rate * (1.0 - discount / 100.0),
                status: BillingStatus::Pending,
            }
        }
        PatientCategory::PaidWithoutConcession => BillingOutcome {
            amount: config.standard_session_rate,
            status: BillingStatus::Pending,
        },
        PatientCategory::SubsidizedCare => BillingOutcome {
            amount: config.subsidized_flat_fee,
            status: BillingStatus::AutoPaid,
        },
        PatientCategory::Other => BillingOutcome {
            amount: config.standard_session_rate,
            status: BillingStatus::Pending,
        },
    };

    debug!(
        "billing rule for {} patient: {:.2} {:?}",
        patient.category, outcome.amount, outcome.status
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(category: PatientCategory) -> Patient {
        Patient::new("Test Patient".to_string(), category)
    }

    #[test]
    fn referral_is_free_and_settled() {
        let outcome = evaluate_billing_rule(&patient(PatientCategory::Referral), &AppConfig::default());
        assert_eq!(outcome.amount, 0.0);
        assert_eq!(outcome.status, BillingStatus::Completed);
    }

    #[test]
    fn vip_amount_is_forced_to_zero() {
        let outcome = evaluate_billing_rule(&patient(PatientCategory::Vip), &AppConfig::default());
        assert_eq!(outcome.amount, 0.0);
        assert_eq!(outcome.status, BillingStatus::AutoPaid);
    }

    #[test]
    fn concession_discount_is_applied() {
        let mut p = patient(PatientCategory::PaidWithConcession);
        p.concession_percent = Some(25.0);
        let config = AppConfig::default();

        let outcome = evaluate_billing_rule(&p, &config);
        assert_eq!(outcome.amount, config.standard_session_rate * 0.75);
        assert_eq!(outcome.status, BillingStatus::Pending);
    }

    #[test]
    fn missing_concession_percent_falls_back_to_full_rate() {
        let p = patient(PatientCategory::PaidWithConcession);
        let config = AppConfig::default();

        let outcome = evaluate_billing_rule(&p, &config);
        assert_eq!(outcome.amount, config.standard_session_rate);
    }

    #[test]
    fn subsidized_care_pays_flat_fee() {
        let config = AppConfig::default();
        let outcome = evaluate_billing_rule(&patient(PatientCategory::SubsidizedCare), &config);
        assert_eq!(outcome.amount, config.subsidized_flat_fee);
        assert_eq!(outcome.status, BillingStatus::AutoPaid);
    }

    #[test]
    fn paid_and_other_share_the_standard_row() {
        let config = AppConfig::default();
        let paid = evaluate_billing_rule(&patient(PatientCategory::PaidWithoutConcession), &config);
        let other = evaluate_billing_rule(&patient(PatientCategory::Other), &config);
        assert_eq!(paid, other);
        assert_eq!(paid.status, BillingStatus::Pending);
    }
}
