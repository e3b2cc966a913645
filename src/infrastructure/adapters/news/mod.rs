//! News Adapter - NewsAPI 客户端实现

mod newsapi_client;

pub use newsapi_client::{NewsApiClient, NewsApiClientConfig};
