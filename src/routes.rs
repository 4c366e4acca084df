use crate::{
    api::{holiday, leave_balance, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    // `finish` only refuses a zero period or burst.
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let review_limiter = Arc::new(build_limiter(config.rate_review_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave-balance") // before /leave
                    // /leave-balance
                    .service(
                        web::resource("").route(web::post().to(leave_balance::create_balance)),
                    )
                    .service(web::resource("/me").route(web::get().to(leave_balance::my_balance)))
                    .service(
                        web::resource("/accrue")
                            .route(web::post().to(leave_balance::accrue_leave)),
                    )
                    // /leave-balance/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(leave_balance::get_balance)),
                    )
                    .service(
                        web::resource("/{employee_id}/grant")
                            .route(web::post().to(leave_balance::grant_leave)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/me (before /{id})
                    .service(web::resource("/me").route(web::get().to(leave_request::my_leaves)))
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::put().to(leave_request::update_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .wrap(review_limiter.clone())
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .wrap(review_limiter.clone())
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/holiday")
                    // /holiday
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    // /holiday/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_tokens;
    use crate::models::TokenType;
    use crate::utils::holiday_cache::HolidayCache;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::json;
    use sqlx::MySqlPool;
    use std::time::Duration;

    const SECRET: &str = "routes-secret";

    #[actix_web::test]
    async fn capability_checks_run_before_storage() {
        let config = Config::for_tests(SECRET);
        // Never connects: every request below is refused before a query.
        let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool))
                .app_data(Data::new(HolidayCache::new(Duration::from_secs(60))))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| configure(cfg, config.clone())),
        )
        .await;
        let peer = "127.0.0.1:4000".parse().unwrap();

        let req = test::TestRequest::get()
            .uri("/api/leave")
            .peer_addr(peer)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let employee = test_tokens::issue(3, 3, Some(30), TokenType::Access, SECRET);
        let req = test::TestRequest::post()
            .uri("/api/holiday")
            .peer_addr(peer)
            .insert_header(("Authorization", format!("Bearer {}", employee)))
            .set_json(json!({ "festival_date": "2026-12-25", "festival_name": "Christmas Day" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/leave")
            .peer_addr(peer)
            .insert_header(("Authorization", format!("Bearer {}", employee)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let admin = test_tokens::issue(1, 1, None, TokenType::Access, SECRET);
        let req = test::TestRequest::post()
            .uri("/api/leave")
            .peer_addr(peer)
            .insert_header(("Authorization", format!("Bearer {}", admin)))
            .set_json(json!({
                "leave_type": "casual",
                "start_date": "2026-11-02",
                "end_date": "2026-11-03"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
