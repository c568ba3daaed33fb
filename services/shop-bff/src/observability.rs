//! 业务指标埋点

use metrics::counter;

pub fn record_login_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("shop_bff_login_attempts_total", "result" => result).increment(1);
}

pub fn record_user_registered() {
    counter!("shop_bff_users_registered_total").increment(1);
}

pub fn record_captcha_issued() {
    counter!("shop_bff_captchas_issued_total").increment(1);
}
