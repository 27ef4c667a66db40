use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use hellod::service;

/// Boots the real service on an OS-assigned port and reports its address.
pub fn start_server() -> SocketAddr {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("runtime not created");
        runtime.block_on(async {
            let server = service::build().bind(0).await.expect("bind failed");
            tx.send(server.local_addr()).expect("address not reported");
            server.run().await.expect("server stopped");
        });
    });

    rx.recv_timeout(Duration::from_secs(5))
        .expect("server did not start")
}

/// Sends one raw HTTP request and returns the full response text.
pub fn send_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect failed");
    stream
        .write_all(request.as_bytes())
        .expect("request not sent");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .expect("response not read");
    response
}
