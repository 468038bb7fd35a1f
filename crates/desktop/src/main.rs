mod app;
mod settings;
mod widgets;
mod workers;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("Lookout")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(app::WINDOW_WIDTH, app::WINDOW_HEIGHT),
            ..Default::default()
        })
        .run()
}
