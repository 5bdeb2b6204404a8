// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SDK clients per service and the operations the bridge child exposes.
//!
//! Parameters and results use the services' JSON member names
//! (`SecretId`, `CiphertextBlob`, ...). Blobs travel as base64 strings;
//! DynamoDB items use the attribute-value wire shape (`{"S": "x"}`).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_smithy_types::Blob;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

use super::AwsError;

pub type OperationFuture = Pin<Box<dyn Future<Output = Result<Value, AwsError>> + Send>>;

/// One callable method: builds its client from the shared configuration and
/// optional endpoint override, then runs against `params`.
pub type Operation = fn(&SdkConfig, Option<&str>, Value) -> OperationFuture;

pub fn kms_client(sdk: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_kms::Client {
    let mut builder = aws_sdk_kms::config::Builder::from(sdk);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_kms::Client::from_conf(builder.build())
}

pub fn secrets_manager_client(sdk: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_secretsmanager::Client {
    let mut builder = aws_sdk_secretsmanager::config::Builder::from(sdk);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_secretsmanager::Client::from_conf(builder.build())
}

pub fn s3_client(sdk: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_s3::Client {
    let mut builder = aws_sdk_s3::config::Builder::from(sdk);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

pub fn dynamo_db_client(sdk: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_dynamodb::Client {
    let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_dynamodb::Client::from_conf(builder.build())
}

// KMS

pub fn kms_decrypt(sdk: &SdkConfig, endpoint: Option<&str>, params: Value) -> OperationFuture {
    let client = kms_client(sdk, endpoint);
    Box::pin(async move {
        let output = client
            .decrypt()
            .set_ciphertext_blob(blob_param(&params, "CiphertextBlob")?)
            .set_key_id(string_param(&params, "KeyId"))
            .set_encryption_context(string_map_param(&params, "EncryptionContext")?)
            .send()
            .await?;
        Ok(json!({
            "KeyId": output.key_id(),
            "Plaintext": output.plaintext().map(encode_blob),
        }))
    })
}

pub fn kms_encrypt(sdk: &SdkConfig, endpoint: Option<&str>, params: Value) -> OperationFuture {
    let client = kms_client(sdk, endpoint);
    Box::pin(async move {
        let output = client
            .encrypt()
            .set_key_id(string_param(&params, "KeyId"))
            .set_plaintext(blob_param(&params, "Plaintext")?)
            .set_encryption_context(string_map_param(&params, "EncryptionContext")?)
            .send()
            .await?;
        Ok(json!({
            "KeyId": output.key_id(),
            "CiphertextBlob": output.ciphertext_blob().map(encode_blob),
        }))
    })
}

// Secrets Manager

pub fn get_secret_value(sdk: &SdkConfig, endpoint: Option<&str>, params: Value) -> OperationFuture {
    let client = secrets_manager_client(sdk, endpoint);
    Box::pin(async move {
        let output = client
            .get_secret_value()
            .set_secret_id(string_param(&params, "SecretId"))
            .set_version_id(string_param(&params, "VersionId"))
            .set_version_stage(string_param(&params, "VersionStage"))
            .send()
            .await?;
        Ok(json!({
            "ARN": output.arn(),
            "Name": output.name(),
            "VersionId": output.version_id(),
            "SecretString": output.secret_string(),
            "SecretBinary": output.secret_binary().map(encode_blob),
        }))
    })
}

pub fn put_secret_value(sdk: &SdkConfig, endpoint: Option<&str>, params: Value) -> OperationFuture {
    let client = secrets_manager_client(sdk, endpoint);
    Box::pin(async move {
        let output = client
            .put_secret_value()
            .set_secret_id(string_param(&params, "SecretId"))
            .set_secret_string(string_param(&params, "SecretString"))
            .set_secret_binary(blob_param(&params, "SecretBinary")?)
            .send()
            .await?;
        Ok(json!({
            "ARN": output.arn(),
            "Name": output.name(),
            "VersionId": output.version_id(),
        }))
    })
}

// S3

pub fn list_buckets(sdk: &SdkConfig, endpoint: Option<&str>, _params: Value) -> OperationFuture {
    let client = s3_client(sdk, endpoint);
    Box::pin(async move {
        let output = client.list_buckets().send().await?;
        let buckets: Vec<Value> = output
            .buckets
            .unwrap_or_default()
            .iter()
            .map(|bucket| json!({ "Name": bucket.name() }))
            .collect();
        let owner = output.owner.as_ref().map(|owner| json!({ "ID": owner.id() }));
        Ok(json!({ "Buckets": buckets, "Owner": owner }))
    })
}

// DynamoDB

pub fn put_item(sdk: &SdkConfig, endpoint: Option<&str>, params: Value) -> OperationFuture {
    let client = dynamo_db_client(sdk, endpoint);
    Box::pin(async move {
        let output = client
            .put_item()
            .set_table_name(string_param(&params, "TableName"))
            .set_item(params.get("Item").map(item_from_json).transpose()?)
            .set_condition_expression(string_param(&params, "ConditionExpression"))
            .set_return_values(string_param(&params, "ReturnValues").map(|v| ReturnValue::from(v.as_str())))
            .send()
            .await?;
        let mut response = Map::new();
        if let Some(attributes) = output.attributes {
            response.insert("Attributes".to_owned(), item_to_json(&attributes));
        }
        Ok(Value::Object(response))
    })
}

pub fn get_item(sdk: &SdkConfig, endpoint: Option<&str>, params: Value) -> OperationFuture {
    let client = dynamo_db_client(sdk, endpoint);
    Box::pin(async move {
        let output = client
            .get_item()
            .set_table_name(string_param(&params, "TableName"))
            .set_key(params.get("Key").map(item_from_json).transpose()?)
            .set_consistent_read(params.get("ConsistentRead").and_then(Value::as_bool))
            .send()
            .await?;
        let mut response = Map::new();
        if let Some(item) = output.item {
            response.insert("Item".to_owned(), item_to_json(&item));
        }
        Ok(Value::Object(response))
    })
}

// Parameters

fn string_param(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn blob_param(params: &Value, key: &str) -> Result<Option<Blob>, AwsError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(encoded)) => decode_blob(encoded).map(Some),
        Some(other) => Err(AwsError::InvalidInput(format!("{key} must be a base64 string, got {other}"))),
    }
}

fn string_map_param(params: &Value, key: &str) -> Result<Option<HashMap<String, String>>, AwsError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                other => Err(AwsError::InvalidInput(format!("{key}.{k} must be a string, got {other}"))),
            })
            .collect::<Result<_, _>>()
            .map(Some),
        Some(other) => Err(AwsError::InvalidInput(format!("{key} must be an object, got {other}"))),
    }
}

pub fn encode_blob(blob: &Blob) -> String {
    STANDARD.encode(blob.as_ref())
}

fn decode_blob(encoded: &str) -> Result<Blob, AwsError> {
    STANDARD
        .decode(encoded)
        .map(Blob::new)
        .map_err(|e| AwsError::InvalidInput(format!("blob is not base64: {e}")))
}

/// `{"name": {"S": "x"}, ...}` into a DynamoDB item.
pub fn item_from_json(value: &Value) -> Result<HashMap<String, AttributeValue>, AwsError> {
    let Value::Object(map) = value else {
        return Err(AwsError::InvalidInput(format!("item must be an object, got {value}")));
    };
    map.iter().map(|(name, attr)| Ok((name.clone(), attribute_from_json(attr)?))).collect()
}

pub fn item_to_json(item: &HashMap<String, AttributeValue>) -> Value {
    Value::Object(item.iter().map(|(name, attr)| (name.clone(), attribute_to_json(attr))).collect())
}

pub fn attribute_from_json(value: &Value) -> Result<AttributeValue, AwsError> {
    let invalid = || AwsError::InvalidInput(format!("invalid attribute value {value}"));
    let (tag, inner) = match value {
        Value::Object(map) if map.len() == 1 => map.iter().next().ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    let attr = match (tag.as_str(), inner) {
        ("S", Value::String(s)) => AttributeValue::S(s.clone()),
        ("N", Value::String(n)) => AttributeValue::N(n.clone()),
        ("N", Value::Number(n)) => AttributeValue::N(n.to_string()),
        ("BOOL", Value::Bool(b)) => AttributeValue::Bool(*b),
        ("NULL", Value::Bool(b)) => AttributeValue::Null(*b),
        ("B", Value::String(s)) => AttributeValue::B(decode_blob(s)?),
        ("SS", Value::Array(items)) => AttributeValue::Ss(string_items(items).ok_or_else(invalid)?),
        ("NS", Value::Array(items)) => AttributeValue::Ns(string_items(items).ok_or_else(invalid)?),
        ("BS", Value::Array(items)) => AttributeValue::Bs(
            string_items(items).ok_or_else(invalid)?.iter().map(|s| decode_blob(s)).collect::<Result<_, _>>()?,
        ),
        ("L", Value::Array(items)) => {
            AttributeValue::L(items.iter().map(attribute_from_json).collect::<Result<_, _>>()?)
        }
        ("M", Value::Object(_)) => AttributeValue::M(item_from_json(inner)?),
        _ => return Err(invalid()),
    };
    Ok(attr)
}

pub fn attribute_to_json(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => json!({ "S": s }),
        AttributeValue::N(n) => json!({ "N": n }),
        AttributeValue::Bool(b) => json!({ "BOOL": b }),
        AttributeValue::Null(b) => json!({ "NULL": b }),
        AttributeValue::B(b) => json!({ "B": encode_blob(b) }),
        AttributeValue::Ss(items) => json!({ "SS": items }),
        AttributeValue::Ns(items) => json!({ "NS": items }),
        AttributeValue::Bs(items) => json!({ "BS": items.iter().map(encode_blob).collect::<Vec<_>>() }),
        AttributeValue::L(items) => json!({ "L": items.iter().map(attribute_to_json).collect::<Vec<_>>() }),
        AttributeValue::M(map) => json!({ "M": item_to_json(map) }),
        _ => Value::Null,
    }
}

fn string_items(items: &[Value]) -> Option<Vec<String>> {
    items.iter().map(|v| v.as_str().map(str::to_owned)).collect()
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;
