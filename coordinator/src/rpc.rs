//! RPC surface the client calls (section 6.2 method table): `login`,
//! `transfer`, `balance`, `history`, `ping`.

use std::sync::Arc;

use gateway_common::api::coordinator::{
    BalanceParams, BalanceResult, HistoryParams, HistoryResult, LoginParams, LoginResult,
    PingResult, TransferOutcome, TransferParams,
};
use gateway_common::rpc::error::RpcError;
use gateway_common::rpc::server::RpcHandler;
use serde_json::Value;

use crate::two_pc::Coordinator;

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

pub fn build_handler(coordinator: Arc<Coordinator>) -> RpcHandler<Arc<Coordinator>> {
    RpcHandler::new(coordinator)
        .method("login", |coordinator, params| async move {
            let params: LoginParams = parse(params)?;
            let token = coordinator
                .login(&params.bank, &params.username, &params.password)
                .await?;
            Ok(serde_json::to_value(LoginResult { token }).unwrap())
        })
        .method("transfer", |coordinator, params| async move {
            let params: TransferParams = parse(params)?;
            let subject = coordinator.verify_token(&params.token)?;
            let outcome: TransferOutcome = coordinator
                .transfer(
                    &subject,
                    params.txid,
                    params.dst_bank,
                    params.dst_user,
                    params.amount,
                )
                .await;
            Ok(serde_json::to_value(outcome).unwrap())
        })
        .method("balance", |coordinator, params| async move {
            let params: BalanceParams = parse(params)?;
            let subject = coordinator.verify_token(&params.token)?;
            let balance = coordinator.balance(&subject).await?;
            Ok(serde_json::to_value(BalanceResult { balance }).unwrap())
        })
        .method("history", |coordinator, params| async move {
            let params: HistoryParams = parse(params)?;
            let subject = coordinator.verify_token(&params.token)?;
            let records = coordinator.history(&subject).await?;
            Ok(serde_json::to_value(HistoryResult { records }).unwrap())
        })
        .method("ping", |_coordinator, _params| async move {
            Ok(serde_json::to_value(PingResult { ok: true }).unwrap())
        })
}
