//! RFC 2136 dynamic update transport over TCP.
//!
//! # Responsibilities
//! - Encode a `ZoneUpdateRequest` as an UPDATE message (zone section
//!   `<zone> IN SOA`, one RR in the update section, no prerequisites)
//! - Exchange it over a length-prefixed TCP stream
//! - Map the response code to success or `UpdateError::Rejected`

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Record, RecordType};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::zone::rdata::{parse_fqdn, parse_rdata};
use crate::zone::{DnsTransport, UpdateError, ZoneUpdateRequest};

/// Build the wire message for an additive update.
pub fn build_update_message(request: &ZoneUpdateRequest) -> Result<Message, UpdateError> {
    let zone = parse_fqdn(&request.zone)?;
    let owner = parse_fqdn(&request.fqdn)?;
    let rdata = parse_rdata(&request.record_type, &request.data)?;

    let mut zone_query = Query::query(zone, RecordType::SOA);
    zone_query.set_query_class(DNSClass::IN);

    // Class IN in the update section means "add to RRset"; ANY/NONE would delete.
    let mut record = Record::from_rdata(owner, request.ttl, rdata);
    record.set_dns_class(DNSClass::IN);

    let mut message = Message::new();
    message
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Update)
        .set_recursion_desired(false);
    message.add_query(zone_query);
    message.add_name_server(record);
    Ok(message)
}

/// Sends updates to a single authoritative server over TCP.
#[derive(Debug, Clone)]
pub struct TcpUpdateTransport {
    server: SocketAddr,
    timeout_duration: Duration,
}

impl TcpUpdateTransport {
    pub fn new(server: SocketAddr, timeout_duration: Duration) -> Self {
        Self {
            server,
            timeout_duration,
        }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    async fn exchange(&self, wire: &[u8]) -> Result<Vec<u8>, UpdateError> {
        let len = u16::try_from(wire.len())
            .map_err(|_| UpdateError::Encode(format!("message too large ({} bytes)", wire.len())))?;

        let mut stream = TcpStream::connect(self.server).await?;
        stream.write_u16(len).await?;
        stream.write_all(wire).await?;
        stream.flush().await?;

        let response_len = stream.read_u16().await? as usize;
        let mut response = vec![0u8; response_len];
        stream.read_exact(&mut response).await?;
        Ok(response)
    }
}

#[async_trait]
impl DnsTransport for TcpUpdateTransport {
    async fn send_update(&self, request: &ZoneUpdateRequest) -> Result<(), UpdateError> {
        let message = build_update_message(request)?;
        let wire = message
            .to_vec()
            .map_err(|e| UpdateError::Encode(e.to_string()))?;

        let raw = timeout(self.timeout_duration, self.exchange(&wire))
            .await
            .map_err(|_| UpdateError::Timeout(self.timeout_duration.as_secs()))??;

        let response =
            Message::from_vec(&raw).map_err(|e| UpdateError::Protocol(e.to_string()))?;
        if response.id() != message.id() {
            return Err(UpdateError::Protocol(format!(
                "response id {} does not match request id {}",
                response.id(),
                message.id()
            )));
        }

        match response.response_code() {
            ResponseCode::NoError => {
                tracing::debug!(server = %self.server, fqdn = %request.fqdn, "DNS update accepted");
                Ok(())
            }
            code => Err(UpdateError::Rejected(code.to_string())),
        }
    }
}
