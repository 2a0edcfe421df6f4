use axum::{ http::{ HeaderValue, Request }, response::Response, middleware::Next, body::Body };

// The dashboard page ships its stylesheet inline and uses inline bar widths.
const PRODUCTION_CSP: &str =
    "default-src 'self'; \
     script-src 'self'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     object-src 'none'; \
     frame-ancestors 'none'; \
     base-uri 'self'; \
     form-action 'self'";

const DEVELOPMENT_CSP: &str =
    "default-src * data: blob: 'unsafe-inline' 'unsafe-eval'; \
     style-src * data: blob: 'unsafe-inline'; \
     img-src * data: blob:; \
     connect-src *";

pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert("X-DNS-Prefetch-Control", HeaderValue::from_static("off"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=15552000; includeSubDomains")
    );
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=(), usb=()")
    );

    let production = std::env::var("ENVIRONMENT").is_ok_and(|e| e == "production");
    let csp = if production { PRODUCTION_CSP } else { DEVELOPMENT_CSP };
    headers.insert("Content-Security-Policy", HeaderValue::from_static(csp));

    response
}
