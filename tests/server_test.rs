use carmine::config::Config;
use carmine::server;

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{sleep, Duration};

/// A basic "hello world" style test. A server instance is started in a
/// background task. A client TCP connection is then established and raw redis
/// commands are sent to the server. The response is evaluated at the byte
/// level.
#[tokio::test]
async fn set_and_get_a_value() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["SET", "foo", "bar"]).await;
    assert_reply(&mut stream, b"+OK\r\n").await;

    write_cmd(&mut stream, &["GET", "foo"]).await;
    assert_reply(&mut stream, b"$3\r\nbar\r\n").await;
}

#[tokio::test]
async fn set_nx_inserts_only_once() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["SET", "foo", "bar", "NX"]).await;
    assert_reply(&mut stream, b":1\r\n").await;

    write_cmd(&mut stream, &["SET", "foo", "baz", "NX"]).await;
    assert_reply(&mut stream, b"$-1\r\n").await;

    write_cmd(&mut stream, &["GET", "foo"]).await;
    assert_reply(&mut stream, b"$3\r\nbar\r\n").await;
}

#[tokio::test]
async fn set_with_ttl_expires() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["SET", "foo", "bar", "EX", "1"]).await;
    assert_reply(&mut stream, b"+OK\r\n").await;

    write_cmd(&mut stream, &["GET", "foo"]).await;
    assert_reply(&mut stream, b"$3\r\nbar\r\n").await;

    // The lazy check runs on access, so no sweep tick is needed.
    sleep(Duration::from_millis(1100)).await;

    write_cmd(&mut stream, &["GET", "foo"]).await;
    assert_reply(&mut stream, b"$-1\r\n").await;
}

#[tokio::test]
async fn list_push_pop_and_range() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["LPUSH", "ls", "1", "2", "3"]).await;
    assert_reply(&mut stream, b":3\r\n").await;

    write_cmd(&mut stream, &["LRANGE", "ls", "0", "-1"]).await;
    assert_reply(&mut stream, b"*3\r\n$1\r\n3\r\n$1\r\n2\r\n$1\r\n1\r\n").await;

    write_cmd(&mut stream, &["RPUSH", "ls", "0"]).await;
    assert_reply(&mut stream, b":4\r\n").await;

    write_cmd(&mut stream, &["LPOP", "ls"]).await;
    assert_reply(&mut stream, b"$1\r\n3\r\n").await;

    write_cmd(&mut stream, &["RPOP", "ls", "2"]).await;
    assert_reply(&mut stream, b"*2\r\n$1\r\n1\r\n$1\r\n0\r\n").await;

    // More than the list holds: nothing is popped.
    write_cmd(&mut stream, &["LPOP", "ls", "5"]).await;
    assert_reply(&mut stream, b"$-1\r\n").await;

    write_cmd(&mut stream, &["LRANGE", "ls", "0", "-1"]).await;
    assert_reply(&mut stream, b"*1\r\n$1\r\n2\r\n").await;
}

#[tokio::test]
async fn hash_fields_round_trip() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["HSET", "h", "a", "1", "b", "2"]).await;
    assert_reply(&mut stream, b":2\r\n").await;

    write_cmd(&mut stream, &["HGET", "h", "b"]).await;
    assert_reply(&mut stream, b"$1\r\n2\r\n").await;

    write_cmd(&mut stream, &["HDEL", "h", "a", "b"]).await;
    assert_reply(&mut stream, b":2\r\n").await;

    write_cmd(&mut stream, &["HGET", "h", "a"]).await;
    assert_reply(&mut stream, b"$-1\r\n").await;
}

#[tokio::test]
async fn set_membership_round_trip() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["SADD", "s", "x"]).await;
    assert_reply(&mut stream, b":1\r\n").await;

    write_cmd(&mut stream, &["SADD", "s", "x"]).await;
    assert_reply(&mut stream, b":0\r\n").await;

    write_cmd(&mut stream, &["SISMEMBER", "s", "x"]).await;
    assert_reply(&mut stream, b":1\r\n").await;

    write_cmd(&mut stream, &["SREM", "s", "x"]).await;
    assert_reply(&mut stream, b":1\r\n").await;

    write_cmd(&mut stream, &["SISMEMBER", "s", "x"]).await;
    assert_reply(&mut stream, b":0\r\n").await;
}

#[tokio::test]
async fn sorted_set_range_by_score() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["ZADD", "z", "1", "x", "2", "y", "3", "z"]).await;
    assert_reply(&mut stream, b":3\r\n").await;

    write_cmd(&mut stream, &["ZRANGEBYSCORE", "z", "2", "3"]).await;
    assert_reply(&mut stream, b"*2\r\n$1\r\ny\r\n$1\r\nz\r\n").await;

    write_cmd(&mut stream, &["ZREM", "z", "y", "missing"]).await;
    assert_reply(&mut stream, b":1\r\n").await;

    write_cmd(&mut stream, &["ZRANGEBYSCORE", "z", "2", "2"]).await;
    assert_reply(&mut stream, b"$-1\r\n").await;
}

#[tokio::test]
async fn wrong_container_kind_is_an_error() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["SET", "k", "v"]).await;
    assert_reply(&mut stream, b"+OK\r\n").await;

    write_cmd(&mut stream, &["LPUSH", "k", "x"]).await;
    assert_reply(
        &mut stream,
        b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
    )
    .await;
}

#[tokio::test]
async fn unknown_and_short_command_lines() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["FLUSHALL", "now"]).await;
    assert_reply(&mut stream, b"-ERR unknown command 'flushall'\r\n").await;

    write_cmd(&mut stream, &["GET"]).await;
    assert_reply(&mut stream, b"-ERR invalid command line\r\n").await;
}

#[tokio::test]
async fn malformed_arguments_keep_the_connection_usable() {
    let (addr, _guard) = start_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    write_cmd(&mut stream, &["EXPIRE", "k", "soon"]).await;
    assert_reply(&mut stream, b"-ERR syntax error\r\n").await;

    write_cmd(&mut stream, &["SET", "k", "v", "EX", "0"]).await;
    assert_reply(&mut stream, b"-ERR invalid expire time\r\n").await;

    write_cmd(&mut stream, &["SET", "k", "v"]).await;
    assert_reply(&mut stream, b"+OK\r\n").await;
}

/// Writes issued on two connections interleave at the writer task; the total
/// effect is a legal merge of both request streams.
#[tokio::test]
async fn concurrent_connections_serialise_at_the_executor() {
    let (addr, _guard) = start_server(Config::default()).await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        tasks.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            for _ in 0..10 {
                write_cmd(&mut stream, &["RPUSH", "ls", "x"]).await;
                // Replies on one connection arrive in request order; the
                // value just depends on the interleaving.
                let reply = read_line(&mut stream).await;
                assert_eq!(reply[0], b':');
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_cmd(&mut stream, &["LPOP", "ls", "20"]).await;

    let mut header = [0; 4];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(&header, b"*20\r");
}

async fn start_server(config: Config) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        server::run(listener, config, async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

async fn write_cmd(stream: &mut TcpStream, args: &[&str]) {
    let mut buf = Vec::new();
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n{}\r\n", arg.len(), arg).as_bytes());
    }
    stream.write_all(&buf).await.unwrap();
}

async fn assert_reply(stream: &mut TcpStream, expected: &[u8]) {
    let mut reply = vec![0; expected.len()];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, expected);
}

/// Read one CRLF-terminated reply line, for replies whose length depends on
/// the interleaving.
async fn read_line(stream: &mut TcpStream) -> Vec<u8> {
    let mut line = Vec::new();
    let mut byte = [0; 1];
    loop {
        stream.read_exact(&mut byte).await.unwrap();
        line.push(byte[0]);
        if byte[0] == b'\n' {
            return line;
        }
    }
}
