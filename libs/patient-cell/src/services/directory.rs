use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{Patient, PatientCategory, SessionAllowance};
use shared_store::ClinicStore;

use crate::models::{PatientError, RegisterPatientRequest, UpdatePatientRequest};

/// The patient directory. Holds the identity, category and aggregate session
/// counters the scheduling engine reads and writes back.
pub struct PatientDirectoryService {
    store: Arc<ClinicStore>,
}

impl PatientDirectoryService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Register a patient. Subsidized-care patients get a fresh session
    /// allowance at registration.
    pub async fn register(&self, request: RegisterPatientRequest) -> Result<Patient, PatientError> {
        if request.full_name.trim().is_empty() {
            return Err(PatientError::ValidationError(
                "Patient name is required".to_string(),
            ));
        }

        let mut patient = Patient::new(request.full_name, request.category);
        patient.concession_percent = request.concession_percent;
        if let Some(total) = request.total_sessions_required {
            patient.total_sessions_required = total;
            patient.remaining_sessions = total;
        }

        info!("registering patient {} ({})", patient.id, patient.category);
        self.store
            .insert_patient(patient)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        self.store
            .get_patient(patient_id)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?
            .ok_or(PatientError::NotFound)
    }

    pub async fn update(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let mut patient = self.get(patient_id).await?;

        if let Some(name) = request.full_name {
            patient.full_name = name;
        }
        if let Some(category) = request.category {
            patient.category = category;
            // Moving into subsidized care starts the allowance; an existing
            // allowance is kept untouched.
            if category == PatientCategory::SubsidizedCare && patient.session_allowance.is_none() {
                patient.session_allowance = Some(SessionAllowance::default());
            }
        }
        if let Some(percent) = request.concession_percent {
            patient.concession_percent = Some(percent);
        }
        if let Some(total) = request.total_sessions_required {
            patient.total_sessions_required = total;
        }
        patient.updated_at = Utc::now();

        self.store
            .update_patient(patient)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    /// Explicit allowance reset. The only path that ever lowers the
    /// allowance counters.
    pub async fn reset_allowance(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        let mut patient = self.get(patient_id).await?;
        if patient.session_allowance.is_none() {
            return Err(PatientError::ValidationError(
                "Patient has no session allowance to reset".to_string(),
            ));
        }

        debug!("resetting session allowance for patient {}", patient_id);
        patient.session_allowance = Some(SessionAllowance::default());
        patient.updated_at = Utc::now();

        self.store
            .update_patient(patient)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }
}
