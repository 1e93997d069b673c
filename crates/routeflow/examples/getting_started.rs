use http::{Method, StatusCode};
use routeflow::handler::verb::VerbHandler;
use routeflow::{Cookie, Flow, RequestContext, ResponseContext, Router, Target};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut router = Router::new();

    // global middleware: tags every response
    router.middleware(routeflow::unit_fn(|req, res, next| {
        info!(method = %req.method(), path = req.path(), "incoming request");
        next.run(req, res)
    }));

    router
        .register(
            "/",
            Target::closure(|_req, res, _next| {
                res.write("welcome\n");
                Ok(Flow::Complete)
            }),
        )
        .unwrap()
        .register(
            "/users/:id",
            Target::handler(
                VerbHandler::new()
                    .get(|req, res| {
                        res.write(format!("user {}\n", req.param("id").unwrap_or("?")));
                        Ok(Flow::Complete)
                    })
                    .post(|req, res| {
                        res.set_status(StatusCode::CREATED);
                        res.cookie(Cookie::new("last-user", req.param("id").unwrap_or("")).path("/"));
                        res.write("created\n");
                        Ok(Flow::Complete)
                    }),
            ),
        )
        .unwrap()
        .register(
            "/legacy/*",
            Target::closure(|_req, res, _next| Ok(res.redirect("/"))),
        )
        .unwrap();

    // an adaptation layer would populate this from a parsed request
    let mut req = RequestContext::builder().method(Method::GET).path("/users/42").query("verbose=1").build();
    let mut res = ResponseContext::new();

    match router.dispatch(&mut req, &mut res) {
        Ok(true) => {
            let response = res.finish();
            info!(status = %response.status(), "dispatch handled");
            print!("{}", String::from_utf8_lossy(response.body()));
        }
        Ok(false) => {
            res.set_status(StatusCode::NOT_FOUND);
            res.write("404 not found\n");
            print!("{}", res.body());
        }
        Err(cause) => {
            // recovery layer: drop the partial attempt, render a diagnostic
            res.reset();
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            res.write(format!("error: {cause}\n"));
            print!("{}", res.body());
        }
    }
}
