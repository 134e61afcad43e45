#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

pub const UDP_ANSWER: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
pub const TCP_ANSWER: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 2);

/// Authoritative-looking server on 127.0.0.1 answering every question with
/// one A record over both UDP and TCP on the same port.
///
/// Names whose first label is `truncated` get an empty TC reply over UDP.
/// Names whose first label is `refused` get REFUSED. Names whose first label
/// is `badid` get a reply with the wrong ID.
pub struct MockDnsServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start() -> Result<Self, std::io::Error> {
        let udp = UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = udp.local_addr()?;
        let tcp = TcpListener::bind(addr).await?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = udp.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            if let Some(reply) = Self::build_reply(&buf[..len], false) {
                                let _ = udp.send_to(&reply, peer).await;
                            }
                        }
                    }
                    result = tcp.accept() => {
                        if let Ok((stream, _)) = result {
                            tokio::spawn(Self::serve_tcp(stream));
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn serve_tcp(mut stream: TcpStream) {
        let mut len_buf = [0u8; 2];
        if stream.read_exact(&mut len_buf).await.is_err() {
            return;
        }
        let mut request = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        if stream.read_exact(&mut request).await.is_err() {
            return;
        }

        if let Some(reply) = Self::build_reply(&request, true) {
            let mut framed = (reply.len() as u16).to_be_bytes().to_vec();
            framed.extend_from_slice(&reply);
            let _ = stream.write_all(&framed).await;
        }
    }

    fn build_reply(request: &[u8], over_tcp: bool) -> Option<Vec<u8>> {
        let request = Message::from_vec(request).ok()?;
        let query = request.queries().first()?.clone();
        let first_label = query
            .name()
            .iter()
            .next()
            .map(|label| String::from_utf8_lossy(label).to_ascii_lowercase())
            .unwrap_or_default();

        let mut reply = Message::new();
        reply
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_authoritative(true)
            .add_query(query.clone());

        match first_label.as_str() {
            "truncated" if !over_tcp => {
                reply.set_truncated(true);
            }
            "refused" => {
                reply.set_response_code(ResponseCode::Refused);
            }
            "badid" => {
                reply.set_id(request.id().wrapping_add(1));
            }
            _ => {
                let address = if over_tcp { TCP_ANSWER } else { UDP_ANSWER };
                reply.add_answer(Record::from_rdata(
                    query.name().clone(),
                    60,
                    RData::A(A(address)),
                ));
            }
        }

        let mut bytes = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut bytes);
        reply.emit(&mut encoder).ok()?;
        Some(bytes)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
