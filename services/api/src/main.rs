#[tokio::main]
async fn main() {
    if let Err(err) = esg_diagnosis_api::run().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
