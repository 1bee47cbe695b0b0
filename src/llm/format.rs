//! URL 构建工具

/// 修复 base_url
///
/// - 移除末尾斜杠
/// - 修复双斜杠（保留协议部分）
pub fn fix_base_url(base_url: &str) -> String {
    let mut url = base_url.trim().trim_end_matches('/').to_string();

    if let Some(pos) = url.find("://") {
        let (protocol, rest) = url.split_at(pos + 3);
        let fixed_rest = rest.replace("//", "/");
        url = format!("{}{}", protocol, fixed_rest);
    }

    url
}

/// 构建 Cohere generate 端点
pub fn build_generate_endpoint(base_url: &str) -> String {
    let url = fix_base_url(base_url);

    if url.ends_with("/generate") {
        url
    } else if url.ends_with("/v1") {
        format!("{}/generate", url)
    } else {
        format!("{}/v1/generate", url)
    }
}
