use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use badcapt_core::export::{ExportError, IndexClient};
use badcapt_markers::masscan::expected_ip_id;
use badcapt_markers::zmap::ZMAP_IP_ID;
use badcapt_protocols::frame::{self, Ipv4Header, TcpHeader};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum IndexCall {
    Exists(String),
    Create(String),
    Document { index: String, category: String, body: Value },
}

/// In-memory stand-in for a search index; keeps every call in order.
#[derive(Default)]
pub struct RecordingIndex {
    pub existing: bool,
    pub calls: Mutex<Vec<IndexCall>>,
}

impl RecordingIndex {
    pub fn with_existing_index() -> Self {
        Self {
            existing: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().clone()
    }

    pub fn documents(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                IndexCall::Document { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl IndexClient for RecordingIndex {
    async fn index_exists(&self, name: &str) -> Result<bool, ExportError> {
        self.calls.lock().push(IndexCall::Exists(name.to_string()));
        Ok(self.existing)
    }

    async fn create_index(&self, name: &str) -> Result<(), ExportError> {
        self.calls.lock().push(IndexCall::Create(name.to_string()));
        Ok(())
    }

    async fn index_document(&self, name: &str, category: &str, body: &Value) -> Result<(), ExportError> {
        self.calls.lock().push(IndexCall::Document {
            index: name.to_string(),
            category: category.to_string(),
            body: body.clone(),
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub const SCANNER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
pub const TARGET: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 9);

pub fn masscan_syn(src_port: u16, dst_port: u16, seq: u32) -> Vec<u8> {
    let ip: Ipv4Header = Ipv4Header::new(SCANNER, TARGET)
        .with_identification(expected_ip_id(u32::from(TARGET), dst_port, seq));
    frame::create_tcp_frame(&ip, &TcpHeader::syn(src_port, dst_port, seq), &[]).unwrap()
}

pub fn mirai_syn(source: Ipv4Addr) -> Vec<u8> {
    let ip: Ipv4Header = Ipv4Header::new(source, TARGET).with_identification(1);
    frame::create_tcp_frame(&ip, &TcpHeader::syn(48211, 23, u32::from(TARGET)), &[]).unwrap()
}

pub fn zmap_udp(payload: &[u8]) -> Vec<u8> {
    let ip: Ipv4Header = Ipv4Header::new(SCANNER, TARGET).with_identification(ZMAP_IP_ID);
    frame::create_udp_frame(&ip, 40123, 161, payload).unwrap()
}

pub fn benign_udp() -> Vec<u8> {
    let ip: Ipv4Header = Ipv4Header::new(Ipv4Addr::new(192, 168, 1, 20), Ipv4Addr::new(192, 168, 1, 1))
        .with_identification(4242);
    frame::create_udp_frame(&ip, 5353, 53, b"\x12\x34\x01\x00").unwrap()
}
