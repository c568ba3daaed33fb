//! 验证码存储
//!
//! 进程内单例，挑战按不透明 id 索引，一次验证即作废（clear-on-use）。
//! verify-and-clear 在锁内完成，同一 id 的并发验证至多一次成功。

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 新挑战的返回信息
#[derive(Debug, Clone)]
pub struct CaptchaInfo {
    pub captcha_id: String,
    pub pic_path: String,
    pub ans: String,
}

struct Entry {
    answer: String,
    expires_at: Instant,
}

/// 进程级验证码存储
pub struct CaptchaStore {
    code_length: usize,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl CaptchaStore {
    pub fn new(code_length: usize, ttl: Duration) -> Self {
        Self {
            code_length,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 生成新挑战，返回 id 与渲染结果
    pub fn new_challenge(&self) -> CaptchaInfo {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0u8..10)))
            .collect();

        let captcha_id = Uuid::now_v7().to_string();
        let pic_path = render_data_url(&code);

        let mut entries = self.lock_entries();
        // 顺带清理已过期的挑战，限制内存占用
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            captcha_id.clone(),
            Entry {
                answer: code.clone(),
                expires_at: now + self.ttl,
            },
        );

        CaptchaInfo {
            captcha_id,
            pic_path,
            ans: code,
        }
    }

    /// 校验答案
    ///
    /// clear_on_use 为 true 时，无论是否匹配，首次校验后挑战即被删除。
    /// 过期的挑战视同不存在。
    pub fn verify(&self, captcha_id: &str, answer: &str, clear_on_use: bool) -> bool {
        let mut entries = self.lock_entries();

        let Some(entry) = entries.get(captcha_id) else {
            return false;
        };

        let expired = entry.expires_at <= Instant::now();
        let matched = !expired && entry.answer == answer;

        if clear_on_use || expired {
            entries.remove(captcha_id);
        }

        matched
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // 锁内不会 panic，中毒只能来自下游的 bug；取回数据继续服务
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 把验证码渲染为内联 SVG 的 data URL
fn render_data_url(code: &str) -> String {
    let width = 28 * code.len().max(1);
    let svg = format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="44">"##,
            r##"<rect width="100%" height="100%" fill="#f4f4f4"/>"##,
            r##"<text x="50%" y="30" font-family="monospace" font-size="26" "##,
            r##"text-anchor="middle" fill="#333" letter-spacing="6">{code}</text>"##,
            "</svg>"
        ),
        w = width,
        code = code,
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}
