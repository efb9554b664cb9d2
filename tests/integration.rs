// End-to-end: Settings → HeliusService / JupiterClient → local mock server.

use httpmock::prelude::*;
use serde_json::json;
use solprobe::engine::jupiter::QuoteRequest;
use solprobe::{
    resolve, HeliusBalanceSource, HeliusService, JupiterClient, Network, ResolutionResult, Settings, Tier,
    WhaleQuery,
};

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        helius_api_key: Some("test-key".into()),
        helius_rpc_url: Some(server.url("/")),
        helius_api_url: Some(server.base_url()),
        retry_backoff_ms: vec![1, 1],
        ..Settings::default()
    }
}

fn source_for(server: &MockServer) -> HeliusBalanceSource {
    HeliusBalanceSource::new(HeliusService::from_settings(&settings_for(server)).unwrap())
}

fn rpc_ok(result: serde_json::Value) -> serde_json::Value {
    json!({"jsonrpc": "2.0", "id": 1, "result": result})
}

async fn mock_balance(server: &MockServer, address: &str, lamports: u64) {
    let quoted = format!("\"{}\"", address);
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getBalance\"").body_contains(quoted);
            then.status(200).json_body(rpc_ok(json!({"context": {"slot": 1}, "value": lamports})));
        })
        .await;
}

async fn mock_mint_decimals(server: &MockServer, decimals: u8) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getAccountInfo\"");
            then.status(200).json_body(rpc_ok(json!({"value": {
                "data": {"parsed": {"info": {"decimals": decimals}}}
            }})));
        })
        .await;
}

async fn mock_too_many_holders(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getTokenLargestAccounts\"");
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 1,
                "error": {"code": -32600, "message": "Too many accounts requested"}}));
        })
        .await;
}

#[tokio::test]
async fn direct_tier_resolves_owner_with_fee_balance() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getTokenLargestAccounts\"");
            then.status(200).json_body(rpc_ok(json!({"value": [
                {"address": "TA1", "amount": "5000000000", "decimals": 6, "uiAmountString": "5000"}
            ]})));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getMultipleAccounts\"");
            then.status(200).json_body(rpc_ok(json!({"value": [
                {"data": {"parsed": {"info": {"owner": "OWNER1"}}}}
            ]})));
        })
        .await;
    mock_balance(&server, "OWNER1", 1_000_000_000).await;

    let query = WhaleQuery::new("MINT", Network::Mainnet);
    let result = resolve(&query, &source_for(&server)).await.unwrap();
    assert_eq!(
        result,
        ResolutionResult::Found { address: "OWNER1".into(), amount: 5000.0, tier: Tier::Direct }
    );
}

#[tokio::test]
async fn too_many_accounts_falls_through_to_scan() {
    let server = MockServer::start_async().await;
    mock_too_many_holders(&server).await;
    mock_mint_decimals(&server, 6).await;
    let scan = server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getTokenAccounts\"");
            then.status(200).json_body(rpc_ok(json!({
                "total": 2, "limit": 1000,
                "token_accounts": [
                    {"address": "ta-small", "owner": "SMALL", "mint": "MINT", "amount": 10},
                    {"address": "ta-whale", "owner": "WHALE", "mint": "MINT", "amount": 5_000_000_000u64}
                ]
            })));
        })
        .await;
    mock_balance(&server, "WHALE", 2_000_000_000).await;

    let query = WhaleQuery::new("MINT", Network::Mainnet);
    let result = resolve(&query, &source_for(&server)).await.unwrap();
    scan.assert_hits_async(1).await;
    assert_eq!(
        result,
        ResolutionResult::Found { address: "WHALE".into(), amount: 5000.0, tier: Tier::Scan }
    );
}

#[tokio::test]
async fn scan_without_qualifier_falls_back_to_largest_holder() {
    let server = MockServer::start_async().await;
    mock_too_many_holders(&server).await;
    mock_mint_decimals(&server, 6).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getTokenAccounts\"");
            then.status(200).json_body(rpc_ok(json!({
                "token_accounts": [
                    {"address": "ta1", "owner": "MINNOW", "mint": "MINT", "amount": 10},
                    {"address": "ta2", "owner": "BIGGEST", "mint": "MINT", "amount": 250_000_000u64}
                ]
            })));
        })
        .await;
    mock_balance(&server, "BIGGEST", 500_000_000).await;

    let query = WhaleQuery::new("MINT", Network::Mainnet);
    let result = resolve(&query, &source_for(&server)).await.unwrap();
    assert_eq!(
        result,
        ResolutionResult::Found { address: "BIGGEST".into(), amount: 250.0, tier: Tier::BestEffort }
    );
}

#[tokio::test]
async fn broken_scan_page_is_fatal() {
    let server = MockServer::start_async().await;
    mock_too_many_holders(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("\"getTokenAccounts\"");
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 1,
                "error": {"code": -32000, "message": "indexer unavailable"}}));
        })
        .await;

    let query = WhaleQuery::new("MINT", Network::Mainnet);
    let err = resolve(&query, &source_for(&server)).await.unwrap_err();
    assert!(matches!(err, solprobe::EngineError::Rpc { code: -32000, .. }));
}

#[tokio::test]
async fn jupiter_quote_from_settings() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/swap/v1/quote")
                .query_param("inputMint", "So11111111111111111111111111111111111111112")
                .query_param("amount", "1500000000")
                .query_param("slippageBps", "50");
            then.status(200).json_body(json!({
                "inputMint": "So11111111111111111111111111111111111111112",
                "inAmount": "1500000000",
                "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "outAmount": "210000000",
                "otherAmountThreshold": "208950000",
                "swapMode": "ExactIn",
                "slippageBps": 50,
                "routePlan": [{"swapInfo": {"label": "Whirlpool"}, "percent": 100}]
            }));
        })
        .await;

    let client = JupiterClient::from_settings(&settings_for(&server)).unwrap().with_host(server.base_url());
    let request = QuoteRequest::new(
        "So11111111111111111111111111111111111111112",
        "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        1_500_000_000,
    )
    .with_slippage_bps(50);
    let quote = client.quote(&request).await.unwrap();
    mock.assert_async().await;
    assert_eq!(quote.out_amount, "210000000");
    assert_eq!(quote.route_labels(), vec!["Whirlpool"]);
    assert_eq!(quote.raw["inAmount"], "1500000000");
}

#[test]
fn service_construction_requires_helius_key() {
    let err = HeliusService::from_settings(&Settings::default()).unwrap_err();
    assert!(matches!(err, solprobe::EngineError::Config(_)));
}
