use std::io::{self, Write};

const HELP: &str = "\
Targets are list names or $TICKER tokens, separated by spaces or commas.

  $TICKER ...                 options, spreads and calendar for the targets
  fetch <targets>             same as above
  options <targets>           premium-selling candidates only
  spreads <targets>           credit spreads only
  calendar <targets>          roll contract months without fetching chains
  report | daily              scan the provider's daily watchlist, hiding empty blocks
  dividends [N]               upcoming ex-dividend entries, optionally the first N

  create <list> ...           create empty lists
  delete <list> ...           delete lists, confirming when not empty
  add <list> <ticker> ...     add tickers to a list
  remove <list> <ticker> ...  remove tickers from a list
  list [list ...]             show lists

  list_months [list ...]      front month per tracked ticker
  refresh                     re-fetch contract months for every tracked ticker

  settings                    show settings
  set <key> <value>           change a setting and save it
  save                        write every data file
  help                        this text
  exit | quit                 save pending changes and leave
";

pub(super) fn run(out: &mut dyn Write) -> io::Result<()> {
    out.write_all(HELP.as_bytes())
}
