use backyard_festival::error::{Error, Step};
use backyard_festival::needs::{
    DetailUpdate, ItemMode, ItemNeedFields, MoneyNeedFields, Need, NeedChanges, NeedDetail,
    NeedStatus, NeedType, NeedsClient, NewNeed, Priority, TimeNeedFields,
};
use backyard_festival::Festival;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, NeedsClient) {
    let server = MockServer::start().await;
    let festival = Festival::new(&server.uri(), Some("test-token".to_string())).unwrap();
    (server, festival.needs())
}

async fn requests(server: &MockServer) -> Vec<(String, String, Option<Value>)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| {
            (
                r.method.to_string(),
                r.url.path().to_string(),
                serde_json::from_slice(&r.body).ok(),
            )
        })
        .collect()
}

fn need_json(id: i64, need_type: &str, sort_order: i64) -> Value {
    json!({
        "id": id,
        "fundraiser": 1,
        "need_type": need_type,
        "title": "Stage hire",
        "description": "",
        "status": "open",
        "priority": "high",
        "sort_order": sort_order
    })
}

fn need(id: i64, need_type: NeedType) -> Need {
    Need {
        id,
        fundraiser: 1,
        need_type,
        title: "Stage hire".to_string(),
        description: String::new(),
        status: NeedStatus::Open,
        priority: Priority::High,
        sort_order: Some(0),
    }
}

fn money(amount: &str) -> NeedDetail {
    NeedDetail::Money(MoneyNeedFields {
        target_amount: amount.to_string(),
        comment: String::new(),
    })
}

fn shift() -> NeedDetail {
    NeedDetail::Time(TimeNeedFields {
        role_title: "Gate volunteer".to_string(),
        location: "North gate".to_string(),
        volunteers_needed: 3,
        start_datetime: Utc.with_ymd_and_hms(2026, 11, 7, 9, 0, 0).unwrap(),
        end_datetime: Utc.with_ymd_and_hms(2026, 11, 7, 13, 0, 0).unwrap(),
        reward_tier: Some(2),
    })
}

#[tokio::test]
async fn test_create_then_resolve_detail() {
    let (server, needs) = setup().await;

    Mock::given(method("POST"))
        .and(path("/needs/"))
        .and(header("Authorization", "Token test-token"))
        .and(body_json(json!({
            "fundraiser": 1,
            "need_type": "money",
            "title": "Stage hire",
            "description": "Sound and lights",
            "status": "open",
            "priority": "high"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(need_json(42, "money", 0)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/money-needs/"))
        .and(body_json(json!({"need": 42, "target_amount": "500.00", "comment": ""})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7, "need": 42, "target_amount": "500.00", "comment": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .and(query_param("need", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "need": 42, "target_amount": "500.00", "comment": ""}
        ])))
        .mount(&server)
        .await;

    let new_need = NewNeed::new(1, "Stage hire")
        .with_description("Sound and lights")
        .with_priority(Priority::High);
    let created = needs.create(new_need, money("500.00")).await.unwrap();

    assert_eq!(created.need.id, 42);
    assert_eq!(created.detail.id, 7);
    assert_eq!(created.detail.need, 42);
    assert_eq!(created.detail.detail, money("500.00"));

    let found = needs.find_detail_id(NeedType::Money, created.need.id).await.unwrap();
    assert_eq!(found, Some(created.detail.id));
}

#[tokio::test]
async fn test_create_detail_failure_keeps_base() {
    let (server, needs) = setup().await;

    Mock::given(method("POST"))
        .and(path("/needs/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(need_json(42, "time", 0)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/time-needs/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "end_datetime": ["End must be after start."]
        })))
        .mount(&server)
        .await;

    let err = needs
        .create(NewNeed::new(1, "Gate shift"), shift())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "end_datetime: End must be after start.");
    match &err {
        Error::CreateDetailFailed { partial, status, .. } => {
            assert_eq!(partial.completed, vec![Step::CreateBase]);
            assert_eq!(partial.failed, Step::CreateDetail);
            assert_eq!(partial.persisted_id, Some(42));
            assert_eq!(status.map(|s| s.as_u16()), Some(400));
        }
        other => panic!("Expected CreateDetailFailed, got {:?}", other),
    }

    // No compensating delete is issued
    let sent = requests(&server).await;
    assert!(sent.iter().all(|(m, _, _)| m != "DELETE"));
    assert_eq!(sent.len(), 2);
}

#[tokio::test]
async fn test_create_base_field_error_message() {
    let (server, needs) = setup().await;

    Mock::given(method("POST"))
        .and(path("/needs/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": ["This field is required."]
        })))
        .mount(&server)
        .await;

    let err = needs
        .create(NewNeed::new(1, "Stage hire"), money("10"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::CreateBaseFailed { .. }));
    assert_eq!(err.to_string(), "title: This field is required.");
    assert_eq!(requests(&server).await.len(), 1);
}

#[tokio::test]
async fn test_create_base_unparsable_body_uses_fallback() {
    let (server, needs) = setup().await;

    Mock::given(method("POST"))
        .and(path("/needs/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = needs
        .create(NewNeed::new(1, "Stage hire"), money("10"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Could not create need.");
}

#[tokio::test]
async fn test_validation_blocks_request() {
    let (server, needs) = setup().await;

    let err = needs
        .create(NewNeed::new(1, "   "), money("10"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let bad_item = NeedDetail::Item(ItemNeedFields {
        item_name: "Trestle tables".to_string(),
        quantity_needed: 0,
        mode: ItemMode::Loan,
        notes: String::new(),
        donation_reward_tier: None,
        loan_reward_tier: None,
    });
    let err = needs
        .create(NewNeed::new(1, "Tables"), bad_item)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // Detail type must match the need
    let err = needs
        .update(&need(3, NeedType::Item), NeedChanges::default(), Some(money("5")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert!(requests(&server).await.is_empty());
}

#[tokio::test]
async fn test_update_omits_need_foreign_key() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/time-needs/"))
        .and(query_param("need", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"id": 9, "need": 3}]
        })))
        .mount(&server)
        .await;

    let mut updated = need_json(3, "time", 0);
    updated["title"] = json!("Gate shift (morning)");
    Mock::given(method("PUT"))
        .and(path("/needs/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/time-needs/9/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9,
            "need": 3,
            "role_title": "Gate volunteer",
            "location": "North gate",
            "volunteers_needed": 3,
            "start_datetime": "2026-11-07T09:00:00Z",
            "end_datetime": "2026-11-07T13:00:00Z",
            "reward_tier": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = needs
        .update(
            &need(3, NeedType::Time),
            NeedChanges::default().title("Gate shift (morning)"),
            Some(shift()),
        )
        .await
        .unwrap();

    assert_eq!(result.need.title, "Gate shift (morning)");
    match &result.detail {
        DetailUpdate::Saved(record) => {
            assert_eq!(record.id, 9);
            assert_eq!(record.detail, shift());
        }
        other => panic!("Expected saved detail, got {:?}", other),
    }

    let sent = requests(&server).await;
    let order: Vec<_> = sent.iter().map(|(m, p, _)| format!("{} {}", m, p)).collect();
    assert_eq!(
        order,
        vec!["GET /time-needs/", "PUT /needs/3/", "PUT /time-needs/9/"]
    );

    let base_body = sent[1].2.as_ref().unwrap();
    for field in [
        "fundraiser",
        "need_type",
        "title",
        "description",
        "status",
        "priority",
        "sort_order",
    ] {
        assert!(base_body.get(field).is_some(), "missing {}", field);
    }

    let detail_body = sent[2].2.as_ref().unwrap();
    assert!(detail_body.get("need").is_none());
    assert_eq!(detail_body["role_title"], "Gate volunteer");
}

#[tokio::test]
async fn test_update_without_detail_row_saves_base_only() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/needs/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(need_json(8, "money", 0)))
        .mount(&server)
        .await;

    let result = needs
        .update(&need(8, NeedType::Money), NeedChanges::default(), Some(money("20")))
        .await
        .unwrap();

    assert_eq!(result.detail, DetailUpdate::NotFound);
    assert!(result.detail_skipped());
    let sent = requests(&server).await;
    assert!(sent.iter().all(|(_, p, _)| p != "/money-needs/8/"));
    assert_eq!(sent.len(), 2);
}

#[tokio::test]
async fn test_update_base_detail_message() {
    let (server, needs) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/needs/5/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let err = needs
        .update(&need(5, NeedType::Item), NeedChanges::default().status(NeedStatus::Closed), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpdateBaseFailed { .. }));
    assert_eq!(err.to_string(), "Not found.");
}

#[tokio::test]
async fn test_update_detail_failure_reports_partial() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "need": 6}])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/needs/6/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(need_json(6, "money", 0)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/money-needs/2/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "target_amount": ["A valid number is required."],
            "comment": ["Too long.", "Really."]
        })))
        .mount(&server)
        .await;

    let err = needs
        .update(&need(6, NeedType::Money), NeedChanges::default(), Some(money("20")))
        .await
        .unwrap_err();

    let message = err.to_string();
    let mut parts: Vec<&str> = message.split(" | ").collect();
    parts.sort();
    assert_eq!(
        parts,
        vec!["comment: Too long. Really.", "target_amount: A valid number is required."]
    );
    let partial = err.partial().unwrap();
    assert_eq!(partial.completed, vec![Step::UpdateBase]);
    assert_eq!(partial.failed, Step::UpdateDetail);
}

#[tokio::test]
async fn test_delete_removes_detail_before_base() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/item-needs/"))
        .and(query_param("need", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 11, "need": "4"}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/item-needs/11/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/needs/4/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    needs.delete(&need(4, NeedType::Item)).await.unwrap();

    let order: Vec<_> = requests(&server)
        .await
        .into_iter()
        .map(|(m, p, _)| format!("{} {}", m, p))
        .collect();
    assert_eq!(
        order,
        vec!["GET /item-needs/", "DELETE /item-needs/11/", "DELETE /needs/4/"]
    );
}

#[tokio::test]
async fn test_delete_without_detail_deletes_base() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/needs/4/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    needs.delete(&need(4, NeedType::Money)).await.unwrap();
    assert_eq!(requests(&server).await.len(), 2);
}

#[tokio::test]
async fn test_delete_base_failure_after_detail() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/time-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 30, "need": 12}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/time-needs/30/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/needs/12/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "detail": "You do not have permission to perform this action."
        })))
        .mount(&server)
        .await;

    let err = needs.delete(&need(12, NeedType::Time)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "You do not have permission to perform this action."
    );
    match err {
        Error::DeleteFailed {
            partial: Some(partial),
            ..
        } => {
            assert_eq!(partial.completed, vec![Step::DeleteDetail]);
            assert_eq!(partial.failed, Step::DeleteBase);
        }
        other => panic!("Expected DeleteFailed with partial, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_detail_failure_stops_before_base() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "need": 2}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/money-needs/1/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = needs.delete(&need(2, NeedType::Money)).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not delete money need.");
    assert!(matches!(err, Error::DeleteFailed { partial: None, .. }));
    assert!(requests(&server)
        .await
        .iter()
        .all(|(_, p, _)| p != "/needs/2/"));
}

#[tokio::test]
async fn test_resolver_requires_exact_match() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .and(query_param("need", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "need": "15"},
            {"id": 2, "need": "5"},
            {"id": 3, "need": 5}
        ])))
        .mount(&server)
        .await;

    let found = needs.find_detail_id(NeedType::Money, 5).await.unwrap();
    assert_eq!(found, Some(2));
}

#[tokio::test]
async fn test_resolver_empty_results() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/time-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    assert_eq!(needs.find_detail_id(NeedType::Time, 1).await.unwrap(), None);
    assert_eq!(needs.find_detail_id(NeedType::Item, 1).await.unwrap(), None);
    assert_eq!(needs.find_detail_id(NeedType::Money, 1).await.unwrap(), None);
}

#[tokio::test]
async fn test_resolver_server_error_is_reported() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/item-needs/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Database unavailable"})))
        .mount(&server)
        .await;

    let err = needs.find_detail_id(NeedType::Item, 1).await.unwrap_err();
    assert!(matches!(err, Error::Api { .. }));
    assert_eq!(err.to_string(), "Database unavailable");
}

#[tokio::test]
async fn test_get_detail_loads_record() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/item-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 21, "need": 9}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item-needs/21/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 21,
            "need": 9,
            "item_name": "Gazebo",
            "quantity_needed": 2,
            "mode": "either",
            "notes": null,
            "donation_reward_tier": null,
            "loan_reward_tier": 4
        })))
        .mount(&server)
        .await;

    let record = needs.get_detail(&need(9, NeedType::Item)).await.unwrap().unwrap();
    assert_eq!(record.id, 21);
    match record.detail {
        NeedDetail::Item(fields) => {
            assert_eq!(fields.item_name, "Gazebo");
            assert_eq!(fields.mode, ItemMode::Either);
            assert_eq!(fields.notes, "");
            assert_eq!(fields.loan_reward_tier, Some(4));
        }
        other => panic!("Expected item detail, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_detail_accepts_string_ids() {
    let (server, needs) = setup().await;

    Mock::given(method("GET"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "7", "need": "3"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/money-needs/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7", "need": "3", "target_amount": "80.00", "comment": ""
        })))
        .mount(&server)
        .await;

    let record = needs.get_detail(&need(3, NeedType::Money)).await.unwrap().unwrap();
    assert_eq!(record.id, 7);
    assert_eq!(record.need, 3);
    assert_eq!(record.detail, money("80.00"));
}

#[tokio::test]
async fn test_created_detail_without_id_is_reported() {
    let (server, needs) = setup().await;

    Mock::given(method("POST"))
        .and(path("/needs/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(need_json(50, "money", 0)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/money-needs/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"target_amount": "5.00"})))
        .mount(&server)
        .await;

    let err = needs
        .create(NewNeed::new(1, "Stage hire"), money("5.00"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "The saved money need detail has no id.");
    match err {
        Error::CreateDetailFailed { partial, .. } => assert_eq!(partial.persisted_id, Some(50)),
        other => panic!("Expected CreateDetailFailed, got {:?}", other),
    }
}
