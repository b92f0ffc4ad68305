use alloy::dyn_abi::EventExt;
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::{Address, LogData};
use serde::Serialize;
use serde_json::Value;

use super::normalize::{named_or_positional, normalize};

const UNPARSED: &str = "unparsed";

/// A transaction log, decoded against the contract ABI when possible
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Event name, or `unparsed`
    pub event: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    /// First topic of a log that could not be decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Decode one log; anything that doesn't match a known event is reported as unparsed
pub fn decode_log(abi: &JsonAbi, address: Address, log: &LogData) -> LogEntry {
    let topic0 = log.topics().first();

    let decoded = topic0.and_then(|topic| {
        abi.events()
            .filter(|e| !e.anonymous && e.selector() == *topic)
            .find_map(|event| match event.decode_log(log) {
                Ok(decoded) => Some((event, decoded.indexed, decoded.body)),
                Err(e) => {
                    tracing::debug!("Log did not decode as {}: {}", event.signature(), e);
                    None
                }
            })
    });

    match decoded {
        Some((event, indexed, body)) => LogEntry {
            event: event.name.clone(),
            address: address.to_checksum(None),
            signature: Some(event.signature()),
            args: Some(event_args(event, indexed, body)),
            topic: None,
            data: None,
        },
        None => LogEntry {
            event: UNPARSED.to_string(),
            address: address.to_checksum(None),
            signature: None,
            args: None,
            topic: topic0.map(|t| format!("{:?}", t)),
            data: Some(format!("0x{}", hex::encode(&log.data))),
        },
    }
}

/// Put indexed and body values back into declaration order
fn event_args(
    event: &Event,
    indexed: Vec<alloy::dyn_abi::DynSolValue>,
    body: Vec<alloy::dyn_abi::DynSolValue>,
) -> Value {
    let mut indexed = indexed.into_iter();
    let mut body = body.into_iter();

    let entries = event
        .inputs
        .iter()
        .filter_map(|input| {
            let value = if input.indexed {
                indexed.next()
            } else {
                body.next()
            }?;
            Some((
                Some(input.name.as_str()),
                normalize(&value, &input.components),
            ))
        })
        .collect();

    named_or_positional(entries)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{B256, Bytes, U256, address};

    use super::*;
    use crate::contracts::abi::{parse_abi, tests::token_abi};

    fn address_topic(addr: Address) -> B256 {
        B256::left_padding_from(addr.as_slice())
    }

    #[test]
    fn test_decodes_known_event() {
        let abi = parse_abi(&token_abi()).unwrap();
        let transfer = abi.event("Transfer").unwrap()[0].clone();

        let from = address!("0000000000000000000000000000000000000001");
        let to = address!("0000000000000000000000000000000000000002");
        let log = LogData::new_unchecked(
            vec![transfer.selector(), address_topic(from), address_topic(to)],
            Bytes::from(U256::from(250).to_be_bytes::<32>().to_vec()),
        );

        let entry = decode_log(&abi, Address::ZERO, &log);
        assert_eq!(entry.event, "Transfer");
        assert_eq!(entry.signature.as_deref(), Some("Transfer(address,address,uint256)"));
        assert_eq!(
            entry.args,
            Some(serde_json::json!({
                "from": from.to_checksum(None),
                "to": to.to_checksum(None),
                "value": "250"
            }))
        );
        assert!(entry.topic.is_none());
    }

    #[test]
    fn test_unknown_event_is_unparsed() {
        let abi = parse_abi(&token_abi()).unwrap();
        let topic = B256::repeat_byte(0x11);
        let log = LogData::new_unchecked(vec![topic], Bytes::from(vec![0x01, 0x02]));

        let entry = decode_log(&abi, Address::ZERO, &log);
        assert_eq!(entry.event, "unparsed");
        assert_eq!(entry.topic, Some(format!("{:?}", topic)));
        assert_eq!(entry.data.as_deref(), Some("0x0102"));
        assert!(entry.args.is_none());
    }

    #[test]
    fn test_truncated_event_is_unparsed() {
        let abi = parse_abi(&token_abi()).unwrap();
        let transfer = abi.event("Transfer").unwrap()[0].clone();

        // Missing both indexed topics
        let log = LogData::new_unchecked(vec![transfer.selector()], Bytes::new());
        let entry = decode_log(&abi, Address::ZERO, &log);
        assert_eq!(entry.event, "unparsed");
    }
}
