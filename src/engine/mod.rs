// Solprobe Engine
//
// Module layout:
//   helpers  resolve_token, validate_address, amount conversions, redact_url
//   http     RetryPolicy, send_with_retry, HttpTransport
//   rpc      JSON-RPC envelope, RpcEndpoints, RpcGateway
//   helius   HeliusService summaries, HeliusBalanceSource
//   whale    BalanceSource, resolve (direct → scan → best effort), prove_any
//   jupiter  JupiterClient: quote, swap build, ultra order, price

pub mod helpers;
pub mod http;
pub mod rpc;

pub mod helius;
pub mod jupiter;
pub mod whale;
