use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::hash::Hash;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Rejection, RpcError, RpcTransport, TransactionStatus};
use crate::config::CommitmentLevel;
use crate::transaction::{Signature, SignedEnvelope};

/// JSON-RPC error code for a transaction that failed preflight simulation.
const SEND_TRANSACTION_PREFLIGHT_FAILURE: i64 = -32002;
const SIGNATURE_VERIFICATION_FAILURE: i64 = -32003;

/// Raw request/response exchange with a node.
///
/// Implementations post `{"jsonrpc": "2.0", "id", "method", "params"}` and
/// return the decoded response object untouched, `error` member included.
/// Only failures to get a response at all belong in `Err`.
#[async_trait]
pub trait JsonRpcSender: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// [`RpcTransport`] over the standard Solana JSON-RPC methods.
#[derive(Debug, Clone)]
pub struct JsonRpcTransport<S> {
    sender: S,
    commitment: CommitmentLevel,
}

impl<S: JsonRpcSender> JsonRpcTransport<S> {
    pub fn new(sender: S, commitment: CommitmentLevel) -> Self {
        Self { sender, commitment }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    async fn request<T: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        tracing::trace!(method, "json-rpc request");
        let response = self.sender.call(method, params).await?;
        let envelope: ResponseEnvelope<T> = serde_json::from_value(response)
            .map_err(|e| RpcError::Transport(format!("{method}: malformed response: {e}")))?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(error.into_rpc_error(method)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcError::Transport(format!(
                "{method}: response has neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl<S: JsonRpcSender> RpcTransport for JsonRpcTransport<S> {
    async fn get_recent_anchor(&self) -> Result<Hash, RpcError> {
        let response: WithContext<LatestBlockhash> = self
            .request(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        Hash::from_str(&response.value.blockhash)
            .map_err(|e| RpcError::Transport(format!("getLatestBlockhash: bad blockhash: {e}")))
    }

    async fn send_transaction(&self, envelope: &SignedEnvelope) -> Result<Signature, RpcError> {
        let signature: String = self
            .request(
                "sendTransaction",
                json!([
                    envelope.to_base64(),
                    {
                        "encoding": "base64",
                        "preflightCommitment": self.commitment.as_str(),
                    }
                ]),
            )
            .await?;
        Signature::from_str(&signature)
            .map_err(|e| RpcError::Transport(format!("sendTransaction: bad signature: {e}")))
    }

    async fn get_transaction_status(
        &self,
        signature: &Signature,
    ) -> Result<TransactionStatus, RpcError> {
        let response: WithContext<Vec<Option<SignatureStatus>>> = self
            .request(
                "getSignatureStatuses",
                json!([[signature.to_string()], { "searchTransactionHistory": true }]),
            )
            .await?;

        let Some(status) = response.value.into_iter().next().flatten() else {
            return Ok(TransactionStatus::Pending);
        };
        if let Some(err) = status.err.filter(|err| !err.is_null()) {
            return Ok(TransactionStatus::Failed(rejection_from_err(
                &err,
                format!("transaction failed: {err}"),
            )));
        }
        let reached = status
            .confirmation_status
            .as_deref()
            .and_then(CommitmentLevel::from_status)
            .is_some_and(|level| level >= self.commitment);
        Ok(if reached {
            TransactionStatus::Confirmed
        } else {
            TransactionStatus::Pending
        })
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        let response: WithContext<Option<AccountInfo>> = self
            .request(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        response
            .value
            .map(|account| {
                STANDARD.decode(account.data.0).map_err(|e| {
                    RpcError::Transport(format!("getAccountInfo: bad account data: {e}"))
                })
            })
            .transpose()
    }
}

#[derive(Deserialize)]
struct ResponseEnvelope<T> {
    result: Option<T>,
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl ErrorObject {
    fn into_rpc_error(self, method: &str) -> RpcError {
        match self.code {
            SEND_TRANSACTION_PREFLIGHT_FAILURE | SIGNATURE_VERIFICATION_FAILURE => {
                let err = self
                    .data
                    .as_ref()
                    .and_then(|data| data.get("err"))
                    .cloned()
                    .unwrap_or(Value::Null);
                RpcError::Rejected(rejection_from_err(&err, self.message))
            }
            code => RpcError::Transport(format!("{method}: {} (code {code})", self.message)),
        }
    }
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<String>,
}

#[derive(Deserialize)]
struct AccountInfo {
    /// `[data, encoding]`
    data: (String, String),
}

/// Pulls `Custom(n)` out of `{"InstructionError": [index, {"Custom": n}]}`.
fn rejection_from_err(err: &Value, reason: String) -> Rejection {
    let code = err
        .get("InstructionError")
        .and_then(|detail| detail.get(1))
        .and_then(|kind| kind.get("Custom"))
        .and_then(Value::as_u64)
        .and_then(|code| u32::try_from(code).ok());
    Rejection { code, reason }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::ZkStorageErrorCode;

    /// Replays canned responses and records every request.
    #[derive(Default)]
    struct ScriptedSender {
        responses: Mutex<VecDeque<Result<Value, RpcError>>>,
        requests: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedSender {
        fn with(responses: Vec<Result<Value, RpcError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JsonRpcSender for ScriptedSender {
        async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RpcError::Transport("no scripted response".into())))
        }
    }

    fn transport(responses: Vec<Result<Value, RpcError>>) -> JsonRpcTransport<ScriptedSender> {
        JsonRpcTransport::new(ScriptedSender::with(responses), CommitmentLevel::Confirmed)
    }

    fn ok(result: Value) -> Result<Value, RpcError> {
        Ok(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
    }

    fn status(value: Value) -> Result<Value, RpcError> {
        ok(json!({ "context": { "slot": 10 }, "value": [value] }))
    }

    #[tokio::test]
    async fn parses_latest_blockhash() {
        let blockhash = Hash::new_from_array([9; 32]);
        let rpc = transport(vec![ok(json!({
            "context": { "slot": 1 },
            "value": { "blockhash": blockhash.to_string(), "lastValidBlockHeight": 100 }
        }))]);

        assert_eq!(rpc.get_recent_anchor().await.unwrap(), blockhash);
        let requests = rpc.sender().requests();
        assert_eq!(requests[0].0, "getLatestBlockhash");
        assert_eq!(requests[0].1, json!([{ "commitment": "confirmed" }]));
    }

    #[tokio::test]
    async fn maps_signature_statuses() {
        let signature = Signature::new([3; 64]);
        let rpc = transport(vec![
            status(Value::Null),
            status(json!({ "slot": 5, "confirmations": 0, "err": null, "confirmationStatus": "processed" })),
            status(json!({ "slot": 5, "confirmations": null, "err": null, "confirmationStatus": "finalized" })),
            status(json!({
                "slot": 5,
                "err": { "InstructionError": [0, { "Custom": 6002 }] },
                "confirmationStatus": "confirmed"
            })),
        ]);

        assert_eq!(
            rpc.get_transaction_status(&signature).await.unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(
            rpc.get_transaction_status(&signature).await.unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(
            rpc.get_transaction_status(&signature).await.unwrap(),
            TransactionStatus::Confirmed
        );
        match rpc.get_transaction_status(&signature).await.unwrap() {
            TransactionStatus::Failed(rejection) => {
                assert_eq!(rejection.program_error(), Some(ZkStorageErrorCode::Unauthorized));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let requests = rpc.sender().requests();
        assert_eq!(requests[0].0, "getSignatureStatuses");
        assert_eq!(requests[0].1[0][0], json!(signature.to_string()));
    }

    #[tokio::test]
    async fn preflight_failure_is_a_rejection() {
        let rpc = transport(vec![Ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": -32002,
                "message": "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0",
                "data": { "err": { "InstructionError": [0, { "Custom": 0 }] }, "logs": [] }
            }
        }))]);

        match rpc.send_transaction(&sample_envelope()).await {
            Err(RpcError::Rejected(rejection)) => {
                assert_eq!(rejection.code, Some(0));
                assert!(rejection.is_already_initialized());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn node_errors_are_transport_failures() {
        let rpc = transport(vec![Ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32005, "message": "Node is unhealthy" }
        }))]);

        let err = rpc.get_recent_anchor().await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(message) if message.contains("unhealthy")));
    }

    #[tokio::test]
    async fn sends_base64_and_parses_signature() {
        let envelope = sample_envelope();
        let rpc = transport(vec![ok(json!(envelope.signature().to_string()))]);

        assert_eq!(
            rpc.send_transaction(&envelope).await.unwrap(),
            envelope.signature()
        );
        let requests = rpc.sender().requests();
        assert_eq!(requests[0].0, "sendTransaction");
        assert_eq!(requests[0].1[0], json!(envelope.to_base64()));
        assert_eq!(requests[0].1[1]["encoding"], json!("base64"));
    }

    #[tokio::test]
    async fn decodes_account_data() {
        let address = Pubkey::new_from_array([4; 32]);
        let rpc = transport(vec![
            ok(json!({
                "context": { "slot": 1 },
                "value": {
                    "data": [STANDARD.encode([1u8, 2, 3]), "base64"],
                    "executable": false,
                    "lamports": 1_000_000,
                    "owner": crate::ID.to_string(),
                    "rentEpoch": 0
                }
            })),
            ok(json!({ "context": { "slot": 1 }, "value": null })),
        ]);

        assert_eq!(
            rpc.get_account_data(&address).await.unwrap(),
            Some(vec![1, 2, 3])
        );
        assert_eq!(rpc.get_account_data(&address).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sender_failures_pass_through() {
        let rpc = transport(vec![Err(RpcError::Transport("connection refused".into()))]);
        assert_eq!(
            rpc.get_recent_anchor().await.unwrap_err(),
            RpcError::Transport("connection refused".into())
        );
    }

    fn sample_envelope() -> SignedEnvelope {
        use crate::keys::KeyMaterial;
        use crate::transaction::Message;

        let keys = KeyMaterial::from_secret_bytes(&[7; 32]);
        let instruction = crate::instructions::initialize_storage(
            &crate::ID,
            &keys.pubkey(),
            &Pubkey::new_from_array([5; 32]),
            "zk_test",
        )
        .unwrap();
        let message =
            Message::compile(&[instruction], &keys.pubkey(), Hash::new_from_array([2; 32]))
                .unwrap();
        SignedEnvelope::sign(message, &keys).unwrap()
    }
}
