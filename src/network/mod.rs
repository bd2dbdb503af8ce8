use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::constants::INGEST_RECV_BUFFER;
use crate::error::{RelayError, Result};
use crate::types::AddressFamily;

/// Creates a UDP socket bound to all IPv4 interfaces for local ingest
pub fn create_ingest_socket(port: u16) -> Result<UdpSocket> {
    let bind_err = |source| RelayError::Bind { port, source };

    let sock_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket
        .set_recv_buffer_size(INGEST_RECV_BUFFER)
        .map_err(bind_err)?;
    socket.bind(&sock_addr.into()).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;

    UdpSocket::from_std(socket.into()).map_err(bind_err)
}

/// IPv6 candidates first, then IPv4, restricted to `family` when forced
pub fn order_candidates(addrs: &[SocketAddr], family: AddressFamily) -> Vec<SocketAddr> {
    let v6 = addrs.iter().filter(|a| a.is_ipv6());
    let v4 = addrs.iter().filter(|a| a.is_ipv4());
    match family {
        AddressFamily::Any => v6.chain(v4).copied().collect(),
        AddressFamily::V6 => v6.copied().collect(),
        AddressFamily::V4 => v4.copied().collect(),
    }
}

/// Resolve `host:port` and return a socket connected to the first usable address
pub async fn open_output_socket(host: &str, port: u16, family: AddressFamily) -> Result<UdpSocket> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| RelayError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    for addr in order_candidates(&addrs, family) {
        info!("sending to {addr}");
        let local = if addr.is_ipv6() {
            SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0))
        } else {
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
        };

        let socket = match UdpSocket::bind(local).await {
            Ok(s) => s,
            Err(e) => {
                warn!("socket for {addr}: {e}");
                continue;
            }
        };
        match socket.connect(addr).await {
            Ok(()) => return Ok(socket),
            Err(e) => warn!("connect to {addr}: {e}"),
        }
    }

    Err(RelayError::NoUsableAddress {
        host: host.to_string(),
        family: family.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs() -> Vec<SocketAddr> {
        vec![
            "192.0.2.1:5678".parse().unwrap(),
            "[2001:db8::1]:5678".parse().unwrap(),
            "192.0.2.2:5678".parse().unwrap(),
        ]
    }

    #[test]
    fn prefers_ipv6() {
        let ordered = order_candidates(&addrs(), AddressFamily::Any);
        assert!(ordered[0].is_ipv6());
        assert_eq!(ordered[1], "192.0.2.1:5678".parse().unwrap());
        assert_eq!(ordered.len(), 3);
    }

    #[test]
    fn forced_family_filters() {
        assert!(order_candidates(&addrs(), AddressFamily::V4).iter().all(|a| a.is_ipv4()));
        assert_eq!(order_candidates(&addrs(), AddressFamily::V6).len(), 1);
    }

    #[tokio::test]
    async fn connects_to_loopback() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let out = open_output_socket("127.0.0.1", port, AddressFamily::V4).await.unwrap();
        out.send(b"ping").await.unwrap();
        let mut buf = [0u8; 8];
        let (n, _) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[tokio::test]
    async fn no_candidate_for_forced_family() {
        let err = open_output_socket("127.0.0.1", 9, AddressFamily::V6).await.unwrap_err();
        assert!(matches!(err, RelayError::NoUsableAddress { .. }));
    }

    #[tokio::test]
    async fn ingest_socket_binds_ephemeral() {
        let sock = create_ingest_socket(0).unwrap();
        assert!(sock.local_addr().unwrap().port() != 0);
    }
}
