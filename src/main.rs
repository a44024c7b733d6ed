use std::ffi::OsString;
use std::io::Write;

use reqwest::{Method, Request, Url};
use rpassword::prompt_password;

use ntlm_transport::Config;


fn usage() -> ! {
    eprintln!("Usage: ntlm-fetch [CONFIG.toml] [URL]");
    std::process::exit(1);
}


#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<OsString> = std::env::args_os().collect();
    if args.len() > 3 {
        usage();
    }
    let config_path = args.get(1)
        .cloned()
        .unwrap_or_else(|| OsString::from("config.toml"));

    // load config
    let config = Config::load(&config_path)
        .expect("failed to load config");

    let url_string = match args.get(2) {
        Some(u) => u.to_str().unwrap_or_else(|| usage()).to_owned(),
        None => config.url.clone(),
    };
    let url = Url::parse(&url_string)
        .expect("failed to parse URL");

    let password = match config.password.as_ref() {
        Some(p) => p.clone(),
        None => prompt_password("PASSWORD? ")
            .expect("failed to read password"),
    };

    let transport = config.transport_builder(password)
        .build()
        .expect("failed to build client");

    let response = transport.execute(Request::new(Method::GET, url))
        .await.expect("failed to fetch resource");
    eprintln!("{} {}", response.status(), response.url());
    let body = response
        .bytes().await.expect("failed to obtain response bytes");

    let stdout = std::io::stdout();
    let mut stdout_lock = stdout.lock();
    stdout_lock.write_all(&body)
        .expect("failed to write response");
    stdout_lock.flush()
        .expect("failed to flush output");
}
