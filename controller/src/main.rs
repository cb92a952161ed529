mod adapters;
mod control;
mod host;
mod ports;
mod resources;
mod server;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
