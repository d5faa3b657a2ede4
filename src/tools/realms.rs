//! Realm tools.

use async_trait::async_trait;
use serde_json::Value;

use super::catalog::{Operation, OperationHandler, ParamDef, ParamType};
use super::str_arg;
use crate::platform::Platform;
use crate::types::Result;

#[derive(Debug)]
struct GetAll;

#[async_trait]
impl OperationHandler for GetAll {
    async fn invoke(&self, platform: &dyn Platform, _args: Value) -> Result<Value> {
        platform.realms().await
    }
}

#[derive(Debug)]
struct GetByName;

#[async_trait]
impl OperationHandler for GetByName {
    async fn invoke(&self, platform: &dyn Platform, args: Value) -> Result<Value> {
        let realm_name = str_arg(&args, "realm_name")?;
        platform.realm(&realm_name).await
    }
}

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            "get_all",
            "Retrieve all realms the service account can see.",
            vec![],
            GetAll,
        ),
        Operation::new(
            "get_by_name",
            "Retrieve a single realm by name.",
            vec![ParamDef::required("realm_name", ParamType::String, "Realm name.")],
            GetByName,
        ),
    ]
}
