use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use billing_cell::models::{BillingError, PurchasePackageRequest};
use billing_cell::services::PackageLedgerService;
use shared_models::{AppointmentStatus, BillingStatus, Patient, PatientCategory};
use shared_store::ClinicStore;

fn purchase_request(patient_id: Uuid) -> PurchasePackageRequest {
    PurchasePackageRequest {
        patient_id,
        clinician_id: Uuid::new_v4(),
        clinician_name: "Dr. Mbeki".to_string(),
        total_sessions: 6,
        amount: 6000.0,
        discount_percent: Some(10.0),
    }
}

#[tokio::test]
async fn package_purchase_creates_billing_and_session_placeholders() {
    let store = Arc::new(ClinicStore::new());
    let patient = Patient::new("Sofia Almeida".to_string(), PatientCategory::Other);
    let patient = store.insert_patient(patient).await.unwrap();

    let service = PackageLedgerService::new(store.clone());
    let purchase = service.purchase(purchase_request(patient.id)).await.unwrap();

    // 6 sessions at 6000 with a 10% discount bills 5400, payable later.
    assert_eq!(purchase.billing_record.amount, 5400.0);
    assert_eq!(purchase.billing_record.status, BillingStatus::Pending);
    assert_eq!(purchase.billing_record.appointment_id, None);
    let package_billing = purchase.billing_record.package.as_ref().unwrap();
    assert_eq!(package_billing.package_id, purchase.package.id);
    assert_eq!(package_billing.sessions, 6);

    assert_eq!(purchase.appointments.len(), 6);
    for (index, appointment) in purchase.appointments.iter().enumerate() {
        assert_eq!(appointment.date, None);
        assert_eq!(appointment.time, None);
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        let link = appointment.package.as_ref().unwrap();
        assert_eq!(link.package_id, purchase.package.id);
        assert_eq!(link.session_number, (index + 1) as u32);
        assert_eq!(link.total_sessions, 6);
    }

    let patient = store.get_patient(patient.id).await.unwrap().unwrap();
    assert_eq!(patient.total_sessions_required, 6);
    assert_eq!(patient.remaining_sessions, 6);
    assert_eq!(patient.package_ids, vec![purchase.package.id]);
}

#[tokio::test]
async fn package_removal_cascades_and_restores_patient_counters() {
    let store = Arc::new(ClinicStore::new());
    let patient = Patient::new("Dmitri Sokolov".to_string(), PatientCategory::Other);
    let patient = store.insert_patient(patient).await.unwrap();

    let service = PackageLedgerService::new(store.clone());
    let purchase = service.purchase(purchase_request(patient.id)).await.unwrap();
    assert_eq!(store.all_appointments().await.unwrap().len(), 6);

    service.remove(patient.id).await.unwrap();

    assert!(store.all_appointments().await.unwrap().is_empty());
    assert!(store.all_billing_records().await.unwrap().is_empty());
    assert!(store
        .get_package(purchase.package.id)
        .await
        .unwrap()
        .is_none());

    let patient = store.get_patient(patient.id).await.unwrap().unwrap();
    assert_eq!(patient.total_sessions_required, 0);
    assert_eq!(patient.remaining_sessions, 0);
    assert!(patient.package_ids.is_empty());
}

#[tokio::test]
async fn removal_converges_after_out_of_band_deletes() {
    let store = Arc::new(ClinicStore::new());
    let patient = Patient::new("Priya Raman".to_string(), PatientCategory::Other);
    let patient = store.insert_patient(patient).await.unwrap();

    let service = PackageLedgerService::new(store.clone());
    let purchase = service.purchase(purchase_request(patient.id)).await.unwrap();

    // One linked session disappears before the cascade runs. Removal works
    // from the live store, so an already-gone document is not a failure.
    store
        .delete_appointment(purchase.appointments[2].id)
        .await
        .unwrap();

    service.remove(patient.id).await.unwrap();

    assert!(store.all_appointments().await.unwrap().is_empty());
    assert!(store.all_billing_records().await.unwrap().is_empty());
    let patient = store.get_patient(patient.id).await.unwrap().unwrap();
    assert!(patient.package_ids.is_empty());
    assert_eq!(patient.total_sessions_required, 0);
}

#[tokio::test]
async fn removal_without_packages_is_rejected() {
    let store = Arc::new(ClinicStore::new());
    let patient = Patient::new("Hanna Virtanen".to_string(), PatientCategory::Other);
    let patient = store.insert_patient(patient).await.unwrap();

    let service = PackageLedgerService::new(store.clone());
    let result = service.remove(patient.id).await;
    assert_matches!(result, Err(BillingError::ValidationError(_)));
}

#[tokio::test]
async fn two_packages_remove_together() {
    let store = Arc::new(ClinicStore::new());
    let patient = Patient::new("Omar Farouk".to_string(), PatientCategory::Other);
    let patient = store.insert_patient(patient).await.unwrap();

    let service = PackageLedgerService::new(store.clone());
    service.purchase(purchase_request(patient.id)).await.unwrap();
    let mut second = purchase_request(patient.id);
    second.total_sessions = 4;
    second.discount_percent = None;
    service.purchase(second).await.unwrap();

    let patient_mid = store.get_patient(patient.id).await.unwrap().unwrap();
    assert_eq!(patient_mid.total_sessions_required, 10);
    assert_eq!(patient_mid.package_ids.len(), 2);

    service.remove(patient.id).await.unwrap();
    assert!(store.all_appointments().await.unwrap().is_empty());
    assert!(store.all_billing_records().await.unwrap().is_empty());
}
