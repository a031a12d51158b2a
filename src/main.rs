#[tokio::main]
async fn main() {
    movie_site_be::start_server().await;
}
