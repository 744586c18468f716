use anyhow::Result;
use skin_analyzer::utils::logging;
use skin_analyzer::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env（可选）
    let _ = dotenvy::dotenv();

    // 加载配置（缺少 LLM_API_KEY 时直接退出）
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
