//! End-to-end registration against the in-memory store

use bson::doc;
use clap::Parser;
use http_body_util::BodyExt;
use hyper::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use vital::auth::CredentialAuthService;
use vital::db::schemas::{
    AuthorityProfile, Panchayat, Taluk, VerificationStatus, Village, AUTHORITY_COLLECTION,
    DISTRICT_COLLECTION, PANCHAYAT_COLLECTION, TALUK_COLLECTION, USER_COLLECTION,
    VILLAGE_COLLECTION,
};
use vital::db::MemoryStore;
use vital::i18n::{resolve, Locale, LocaleRoute};
use vital::notify::LogNotifier;
use vital::routes::{self, register::RegisterRequest, BoxBody};
use vital::{AppState, Args};

struct Seeded {
    district: String,
    taluk: String,
    village: String,
    panchayat: String,
}

fn app(store: Arc<MemoryStore>) -> AppState {
    let args = Args::try_parse_from(["vital"]).unwrap();
    let auth = Arc::new(CredentialAuthService::new(store.clone(), true));
    AppState::new(args, store, "memory", auth, Arc::new(LogNotifier)).unwrap()
}

fn seed(store: &MemoryStore) -> Seeded {
    let district = store.seed(DISTRICT_COLLECTION, doc! { "name": "Dharwad", "state": "Karnataka" });
    let taluk = store.seed(
        TALUK_COLLECTION,
        doc! { "name": "Kalghatgi", "districtId": district.as_str(), "districtName": "Dharwad" },
    );
    let village = store.seed(
        VILLAGE_COLLECTION,
        doc! {
            "name": "Tabakadahonnalli",
            "districtId": district.as_str(),
            "districtName": "Dharwad",
            "talukId": taluk.as_str(),
            "talukName": "Kalghatgi",
        },
    );
    let panchayat = store.seed(
        PANCHAYAT_COLLECTION,
        doc! {
            "name": "Tabakadahonnalli GP",
            "villageId": village.as_str(),
            "villageName": "Tabakadahonnalli",
            "talukId": taluk.as_str(),
            "talukName": "Kalghatgi",
            "districtId": district.as_str(),
            "districtName": "Dharwad",
        },
    );
    Seeded {
        district,
        taluk,
        village,
        panchayat,
    }
}

fn request(body: Value) -> RegisterRequest {
    let mut base = json!({
        "name": "Shivakumar Patil",
        "email": "shivakumar@example.in",
        "password": "Dharwad#2024",
        "mobile": "+91 94480 55555",
        "aadhaar": "4321-8765-2109",
        "officeAddress": "Gram Panchayat Office, Tabakadahonnalli",
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), body.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(base).unwrap()
}

async fn body_json(response: hyper::Response<BoxBody>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn all_selected_levels_write_only_profile_and_user() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store);
    let state = app(store.clone());

    let req = request(json!({
        "role": "pdo",
        "district": { "selected": ids.district },
        "taluk": { "selected": ids.taluk },
        "village": { "selected": ids.village },
        "panchayat": { "selected": ids.panchayat },
        "gramPanchayatId": "GP-0042",
    }));
    let response = routes::register::submit(&state, Locale::Kn, &req).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["redirect"], "/kn/authority/status");

    for collection in [
        DISTRICT_COLLECTION,
        TALUK_COLLECTION,
        VILLAGE_COLLECTION,
        PANCHAYAT_COLLECTION,
    ] {
        assert_eq!(store.count(collection), 1, "{}", collection);
    }
    assert_eq!(store.count(USER_COLLECTION), 1);

    let profiles = store.documents(AUTHORITY_COLLECTION);
    assert_eq!(profiles.len(), 1);
    let profile: AuthorityProfile = profiles[0].decode().unwrap();
    assert_eq!(profile.uid, body["uid"]);
    assert_eq!(profile.status, VerificationStatus::Pending);
    assert_eq!(profile.verification.status, VerificationStatus::Pending);
    assert_eq!(profile.mobile, "9194480555");
    assert_eq!(profile.aadhaar, "432187652109");
    assert_eq!(profile.panchayat.as_deref(), Some("Tabakadahonnalli GP"));
    assert!(!profile.is_manual_entry.district);
}

#[tokio::test]
async fn all_manual_levels_create_linked_hierarchy() {
    let store = Arc::new(MemoryStore::new());
    let state = app(store.clone());

    let req = request(json!({
        "role": "village_incharge",
        "district": { "manual": "Haveri" },
        "taluk": { "manual": "Shiggaon" },
        "village": { "manual": "Bankapur" },
        "panchayat": { "manual": "Bankapur GP" },
        "gramPanchayatId": "GP-7781",
    }));
    let response = routes::register::submit(&state, Locale::En, &req).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let districts = store.documents(DISTRICT_COLLECTION);
    assert_eq!(districts.len(), 1);
    let taluk: Taluk = store.documents(TALUK_COLLECTION)[0].decode().unwrap();
    assert_eq!(taluk.district_id, districts[0].id);
    let village: Village = store.documents(VILLAGE_COLLECTION)[0].decode().unwrap();
    assert_eq!(Some(village.taluk_id.clone()), taluk.id);
    let panchayat: Panchayat = store.documents(PANCHAYAT_COLLECTION)[0].decode().unwrap();
    assert_eq!(Some(panchayat.village_id.clone()), village.id);
    assert_eq!(panchayat.district_name, "Haveri");
    assert_eq!(panchayat.gram_panchayat_id.as_deref(), Some("GP-7781"));
}

#[tokio::test]
async fn role_decides_required_levels() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store);
    let state = app(store.clone());

    let ddo = request(json!({
        "role": "ddo",
        "district": { "selected": ids.district },
    }));
    let response = routes::register::submit(&state, Locale::En, &ddo).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut pdo = request(json!({
        "role": "pdo",
        "district": { "selected": ids.district },
    }));
    pdo.email = "second@example.in".into();
    let response = routes::register::submit(&state, Locale::En, &pdo).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Please select a taluk");
    assert_eq!(body["code"], "VALIDATION_TALUK");
    assert_eq!(store.count(AUTHORITY_COLLECTION), 1);
}

#[tokio::test]
async fn duplicate_email_is_reported_without_new_writes() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store);
    let state = app(store.clone());
    let req = request(json!({
        "role": "ddo",
        "district": { "selected": ids.district },
    }));

    let first = routes::register::submit(&state, Locale::En, &req).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = routes::register::submit(&state, Locale::En, &req).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["error"], "Email already registered");
    assert_eq!(store.count(AUTHORITY_COLLECTION), 1);
}

#[tokio::test]
async fn status_page_reflects_pending_registration() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store);
    let state = app(store.clone());
    let req = request(json!({
        "role": "tdo",
        "district": { "selected": ids.district },
        "taluk": { "manual": "Alnavar" },
    }));
    let created = body_json(routes::register::submit(&state, Locale::En, &req).await).await;
    let uid = created["uid"].as_str().unwrap().to_string();

    let response = routes::handle_status(&state, Locale::En, Some(format!("uid={}", uid).as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Your registration is awaiting admin verification.");

    let missing = routes::handle_status(&state, Locale::En, Some("uid=nobody")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn page_model_is_localized_with_fallbacks() {
    let state = app(Arc::new(MemoryStore::new()));

    let body = body_json(routes::register_page(&state, Locale::Kn)).await;

    assert_eq!(body["locale"], "kn");
    assert_ne!(body["labels"]["title"], "Authority Registration");
    // Role labels exist only in English
    assert_eq!(body["roles"][3]["label"], "District Development Officer");
    let taluk = &body["levels"][1];
    assert_eq!(taluk["level"], "taluk");
    assert!(!taluk["cantFind"].as_str().unwrap().contains("{item}"));
    assert_eq!(taluk["requiredFor"], json!(["pdo", "village_incharge", "tdo"]));
}

#[tokio::test]
async fn hierarchy_api_fails_open_on_empty_parent() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store);
    let state = app(store);

    let body = body_json(
        routes::handle_hierarchy_request(&state, "taluks", Some(format!("districtId={}", ids.district).as_str())).await,
    )
    .await;
    assert_eq!(body["items"][0]["name"], "Kalghatgi");
    assert_eq!(body["manualEntry"], false);

    let body = body_json(routes::handle_hierarchy_request(&state, "villages", Some("talukId=none")).await).await;
    assert_eq!(body["manualEntry"], true);

    let response = routes::handle_hierarchy_request(&state, "panchayats", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn locale_router_examples() {
    assert_eq!(resolve("/"), LocaleRoute::Redirect("/en".into()));
    assert_eq!(resolve("/kn/authority/register"), LocaleRoute::Localized(Locale::Kn));
    assert_eq!(resolve("/_next/static/x.js"), LocaleRoute::Excluded);
    assert_eq!(resolve("/fr/x"), LocaleRoute::Redirect("/en/fr/x".into()));
}

#[test]
fn config_rejects_notify_without_url() {
    let args = Args::try_parse_from(["vital", "--notify-enabled"]).unwrap();
    assert_err!(args.validate());
    let args = Args::try_parse_from(["vital"]).unwrap();
    assert_ok!(args.validate());
}

#[tokio::test]
async fn health_reports_memory_store() {
    let state = app(Arc::new(MemoryStore::new()));

    let body = body_json(routes::health_check(&state)).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["store"], "memory");
    assert_eq!(body["devMode"], false);
}

#[tokio::test]
async fn field_errors_come_before_unlisted_choices() {
    let store = Arc::new(MemoryStore::new());
    seed(&store);
    let state = app(store.clone());

    let req = request(json!({
        "role": "ddo",
        "name": "",
        "district": { "selected": "gone" },
    }));
    let response = routes::register::submit(&state, Locale::En, &req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_NAME");

    let req = request(json!({
        "role": "ddo",
        "district": { "selected": "gone" },
    }));
    let body = body_json(routes::register::submit(&state, Locale::En, &req).await).await;
    assert_eq!(body["code"], "VALIDATION_DISTRICT");
    assert_eq!(store.count(AUTHORITY_COLLECTION), 0);
}
