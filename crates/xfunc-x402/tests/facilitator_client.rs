//! Facilitator client tests against a stub facilitator.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xfunc_types::facilitator::Facilitator;
use xfunc_types::proto::Kind;
use xfunc_types::proto::v1::{
    FacilitatorRequest, PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse,
    X402Version1,
};
use xfunc_x402::{FacilitatorClient, FacilitatorClientError};

fn sample_request() -> FacilitatorRequest {
    FacilitatorRequest {
        x402_version: X402Version1,
        payment_payload: PaymentPayload {
            x402_version: X402Version1,
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            payload: json!({ "signature": "0xSig" }),
        },
        payment_requirements: PaymentRequirements {
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            max_amount_required: "10000".to_string(),
            resource: "http://api.example.test/pay".to_string(),
            description: "test".to_string(),
            mime_type: None,
            output_schema: None,
            pay_to: "0xPayee".to_string(),
            max_timeout_seconds: 30,
            asset: "0xAsset".to_string(),
            extra: None,
        },
    }
}

#[tokio::test]
async fn verify_posts_envelope_and_parses_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "x402Version": 1,
            "paymentPayload": {
                "x402Version": 1,
                "scheme": "exact",
                "network": "base-sepolia"
            },
            "paymentRequirements": {
                "scheme": "exact",
                "maxAmountRequired": "10000",
                "payTo": "0xPayee"
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "isValid": true, "payer": "0xPayer" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
    let response = client.verify(&sample_request()).await.unwrap();
    assert_eq!(
        response,
        VerifyResponse::Valid {
            payer: "0xPayer".to_string()
        }
    );
}

#[tokio::test]
async fn settle_parses_failure_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/settle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errorReason": "tx_reverted",
            "transaction": "",
            "network": "base-sepolia"
        })))
        .mount(&server)
        .await;

    let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
    let response = client.settle(&sample_request()).await.unwrap();
    assert_eq!(
        response,
        SettleResponse::Error {
            reason: "tx_reverted".to_string(),
            network: "base-sepolia".to_string()
        }
    );
}

#[tokio::test]
async fn non_200_is_an_error_with_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(418).set_body_string("teapot"))
        .mount(&server)
        .await;

    let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
    let err = client.verify(&sample_request()).await.unwrap_err();
    match err {
        FacilitatorClientError::HttpStatus { status, body, .. } => {
            assert_eq!(status.as_u16(), 418);
            assert_eq!(body, "teapot");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn supported_collects_kinds_into_a_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/supported"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kinds": [
                { "scheme": "exact", "network": "base-sepolia" },
                { "scheme": "exact", "network": "base-sepolia" },
                { "scheme": "exact", "network": "base" }
            ]
        })))
        .mount(&server)
        .await;

    let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
    let kinds = client.supported().await.unwrap().into_set();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&Kind {
        scheme: "exact".to_string(),
        network: "base-sepolia".to_string()
    }));
}
